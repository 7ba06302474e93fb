//! Session – Verarbeitet die Events einer einzelnen Verbindung
//!
//! Jede Verbindung bekommt eine `Session` in einem eigenen tokio-Task. Die
//! Session registriert ihren Handle im [`Chatroom`], dekodiert eingehende
//! Frames der Reihe nach und verteilt die Folge-Events.
//!
//! ## State Machine
//! ```text
//! Verbunden --add user--> Benannt --(Trennung/Fehler)--> Geschlossen
//!     |                                                       ^
//!     +-------------------(Trennung/Fehler)-------------------+
//! ```
//!
//! Beim Schliessen wird `user left` nur verteilt, wenn die Session einen
//! nicht-leeren Namen gesetzt hatte. Danach wird der Handle entfernt.

use chatroom_protocol::{dekodieren, kodieren, AusgehendesEvent, EingehendesEvent, ProtokollFehler};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

use crate::broadcast::Chatroom;
use crate::error::SignalingResult;
use crate::verbindung::{TransportFehler, Verbindung, VerbindungsId};

// ---------------------------------------------------------------------------
// Zustand
// ---------------------------------------------------------------------------

/// Zustand einer Session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionZustand {
    /// Registriert, noch kein Name
    Verbunden,
    /// `add user` wurde verarbeitet
    Benannt,
    /// Endzustand, Handle ist deregistriert
    Geschlossen,
}

/// Grund fuer das Ende der Verarbeitungsschleife
#[derive(Debug)]
pub enum SessionEnde {
    /// Gegenstelle hat die Verbindung geordnet geschlossen
    Getrennt,
    /// Empfangen ist fehlgeschlagen
    Transport(TransportFehler),
    /// Frame war kein gueltiges Event
    Dekodierung(ProtokollFehler),
}

impl fmt::Display for SessionEnde {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Getrennt => write!(f, "vom Client getrennt"),
            Self::Transport(fehler) => write!(f, "{fehler}"),
            Self::Dekodierung(fehler) => write!(f, "{fehler}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Zustand und Verarbeitungsschleife einer Verbindung
pub struct Session {
    chatroom: Chatroom,
    verbindung: Arc<dyn Verbindung>,
    /// Anzeigename, leer bis `add user` verarbeitet wurde
    benutzername: String,
    zustand: SessionZustand,
    gestartet: DateTime<Utc>,
}

impl Session {
    /// Registriert den Handle im Chatroom und erstellt die Session
    pub async fn starten(chatroom: Chatroom, verbindung: Arc<dyn Verbindung>) -> Self {
        if !chatroom.hinzufuegen(Arc::clone(&verbindung)).await {
            tracing::debug!(verbindung = %verbindung.id(), "Handle war bereits registriert");
        }
        Self::erstellen(chatroom, verbindung)
    }

    /// Wie [`Session::starten`], aber nur solange der Raum weniger als
    /// `max_teilnehmer` Handles hat (`0` = unbegrenzt)
    ///
    /// `None` wenn der Raum voll oder der Handle bereits registriert ist.
    pub async fn beitreten(
        chatroom: Chatroom,
        verbindung: Arc<dyn Verbindung>,
        max_teilnehmer: usize,
    ) -> Option<Self> {
        if chatroom
            .hinzufuegen_begrenzt(Arc::clone(&verbindung), max_teilnehmer)
            .await
        {
            Some(Self::erstellen(chatroom, verbindung))
        } else {
            None
        }
    }

    fn erstellen(chatroom: Chatroom, verbindung: Arc<dyn Verbindung>) -> Self {
        Self {
            chatroom,
            verbindung,
            benutzername: String::new(),
            zustand: SessionZustand::Verbunden,
            gestartet: Utc::now(),
        }
    }

    /// Id des zugehoerigen Handles
    pub fn id(&self) -> VerbindungsId {
        self.verbindung.id()
    }

    pub fn zustand(&self) -> &SessionZustand {
        &self.zustand
    }

    pub fn benutzername(&self) -> &str {
        &self.benutzername
    }

    /// Verarbeitet Frames bis die Verbindung endet, schliesst danach die Session
    ///
    /// Danach ist die Session im Zustand [`SessionZustand::Geschlossen`].
    pub async fn verarbeiten(&mut self) -> SessionEnde {
        let span = tracing::info_span!("session", verbindung = %self.id());
        async move {
            tracing::info!("Session gestartet");

            let ende = loop {
                let text = match self.verbindung.empfangen().await {
                    Ok(Some(text)) => text,
                    Ok(None) => break SessionEnde::Getrennt,
                    Err(fehler) => {
                        tracing::warn!(fehler = %fehler, "Empfangen fehlgeschlagen");
                        break SessionEnde::Transport(fehler);
                    }
                };

                let event = match dekodieren(&text) {
                    Ok(event) => event,
                    Err(fehler) => {
                        tracing::warn!(fehler = %fehler, "Ungueltiges Event empfangen");
                        break SessionEnde::Dekodierung(fehler);
                    }
                };

                tracing::debug!(event = ?event, "Event empfangen");

                if let Err(fehler) = self.event_behandeln(event).await {
                    tracing::warn!(fehler = %fehler, "Event-Verarbeitung fehlgeschlagen");
                }
            };

            self.schliessen().await;

            let dauer = Utc::now() - self.gestartet;
            tracing::info!(
                grund = %ende,
                dauer_sek = dauer.num_seconds(),
                "Session beendet"
            );
            ende
        }
        .instrument(span)
        .await
    }

    /// Verarbeitet ein einzelnes eingehendes Event
    pub async fn event_behandeln(&mut self, event: EingehendesEvent) -> SignalingResult<()> {
        match event {
            EingehendesEvent::BenutzerHinzufuegen { name } => {
                let login = kodieren(&AusgehendesEvent::Login {
                    anzahl: self.chatroom.anzahl().await,
                })?;
                if let Err(fehler) = self
                    .chatroom
                    .direkt_senden(self.verbindung.as_ref(), &login)
                    .await
                {
                    tracing::warn!(fehler = %fehler, "Login-Antwort fehlgeschlagen");
                    // Wie beim Broadcast: defekter Handle ist kein Ziel mehr
                    self.chatroom.entfernen(self.id()).await;
                }

                self.benutzername = name;
                self.zustand = SessionZustand::Benannt;
                tracing::info!(benutzername = %self.benutzername, "Benutzer angemeldet");

                let beigetreten = kodieren(&AusgehendesEvent::BenutzerBeigetreten {
                    benutzername: self.benutzername.clone(),
                    anzahl: self.chatroom.anzahl().await,
                })?;
                self.verteilen(&beigetreten).await;
            }
            EingehendesEvent::NeueNachricht { text } => {
                let nachricht = kodieren(&AusgehendesEvent::NeueNachricht {
                    benutzername: self.benutzername.clone(),
                    nachricht: text,
                })?;
                self.verteilen(&nachricht).await;
            }
            EingehendesEvent::Unbekannt { event } => {
                tracing::debug!(event = %event, "Unbekanntes Event ignoriert");
            }
        }
        Ok(())
    }

    /// Verteilt an alle anderen, Teilausfaelle werden nur protokolliert
    async fn verteilen(&self, nachricht: &str) {
        let bericht = self.chatroom.an_alle_ausser_senden(nachricht, self.id()).await;
        if !bericht.ist_vollstaendig() {
            tracing::warn!(
                zugestellt = bericht.zugestellt,
                fehlgeschlagen = bericht.fehler.len(),
                "Broadcast unvollstaendig"
            );
        }
    }

    /// Abmeldung verteilen (falls benannt) und Handle deregistrieren
    async fn schliessen(&mut self) {
        if !self.benutzername.is_empty() {
            let verlassen = AusgehendesEvent::BenutzerVerlassen {
                benutzername: self.benutzername.clone(),
                anzahl: self.chatroom.anzahl_ohne(self.id()).await,
            };
            match kodieren(&verlassen) {
                Ok(text) => self.verteilen(&text).await,
                Err(fehler) => tracing::warn!(fehler = %fehler, "Abmeldung nicht kodierbar"),
            }
        }

        self.chatroom.entfernen(self.id()).await;
        self.zustand = SessionZustand::Geschlossen;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
