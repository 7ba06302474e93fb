//! Chatroom-Events
//!
//! Eingehende Events kommen als `{"event": <name>, "data": <string>}` vom
//! Client. Ausgehende Events werden in einen [`Umschlag`] verpackt, dessen
//! `data`-Objekt nur die jeweils belegten Felder enthaelt.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event-Namen
// ---------------------------------------------------------------------------

/// Client meldet sich mit Anzeigenamen an
pub const EVENT_ADD_USER: &str = "add user";
/// Chat-Nachricht (in beide Richtungen)
pub const EVENT_NEW_MESSAGE: &str = "new message";
/// Private Login-Bestaetigung an den Anmeldenden
pub const EVENT_LOGIN: &str = "login";
/// Ein anderer Benutzer ist beigetreten
pub const EVENT_USER_JOINED: &str = "user joined";
/// Ein Benutzer hat den Raum verlassen
pub const EVENT_USER_LEFT: &str = "user left";

// ---------------------------------------------------------------------------
// Eingehende Events
// ---------------------------------------------------------------------------

/// Rohes eingehendes Event wie es auf dem Draht liegt
///
/// `event` und `data` duerfen fehlen oder `null` sein und werden dann als
/// leerer String behandelt. Ein Event ohne Namen ist damit unbekannt, aber
/// kein Dekodierfehler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RohesEvent {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

/// Vom Client gesendetes Event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EingehendesEvent {
    /// `"add user"` – setzt den Anzeigenamen der Session
    BenutzerHinzufuegen { name: String },
    /// `"new message"` – Text an alle anderen Teilnehmer
    NeueNachricht { text: String },
    /// Unbekannter Event-Name, wird von der Session ignoriert
    Unbekannt { event: String },
}

impl From<RohesEvent> for EingehendesEvent {
    fn from(roh: RohesEvent) -> Self {
        let data = roh.data.unwrap_or_default();
        let event = roh.event.unwrap_or_default();
        match event.as_str() {
            EVENT_ADD_USER => Self::BenutzerHinzufuegen { name: data },
            EVENT_NEW_MESSAGE => Self::NeueNachricht { text: data },
            _ => Self::Unbekannt { event },
        }
    }
}

// ---------------------------------------------------------------------------
// Ausgehende Events
// ---------------------------------------------------------------------------

/// Vom Server gesendetes Event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AusgehendesEvent {
    /// Antwort auf `"add user"`, nur an den Anmeldenden
    Login { anzahl: usize },
    /// Broadcast: neuer Teilnehmer
    BenutzerBeigetreten { benutzername: String, anzahl: usize },
    /// Broadcast: Chat-Nachricht eines Teilnehmers
    NeueNachricht {
        benutzername: String,
        nachricht: String,
    },
    /// Broadcast: Teilnehmer hat die Verbindung getrennt
    BenutzerVerlassen { benutzername: String, anzahl: usize },
}

impl AusgehendesEvent {
    /// Event-Name auf dem Draht
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => EVENT_LOGIN,
            Self::BenutzerBeigetreten { .. } => EVENT_USER_JOINED,
            Self::NeueNachricht { .. } => EVENT_NEW_MESSAGE,
            Self::BenutzerVerlassen { .. } => EVENT_USER_LEFT,
        }
    }

    /// Verpackt das Event in das Wire-Format
    pub fn umschlag(&self) -> Umschlag {
        let data = match self {
            Self::Login { anzahl } => EventDaten {
                anzahl: Some(*anzahl),
                ..Default::default()
            },
            Self::BenutzerBeigetreten {
                benutzername,
                anzahl,
            }
            | Self::BenutzerVerlassen {
                benutzername,
                anzahl,
            } => EventDaten {
                benutzername: nicht_leer(benutzername),
                anzahl: Some(*anzahl),
                ..Default::default()
            },
            Self::NeueNachricht {
                benutzername,
                nachricht,
            } => EventDaten {
                benutzername: nicht_leer(benutzername),
                nachricht: nicht_leer(nachricht),
                ..Default::default()
            },
        };

        Umschlag {
            event: self.name().to_string(),
            data,
        }
    }
}

/// Leere Strings werden auf dem Draht weggelassen
fn nicht_leer(wert: &str) -> Option<String> {
    if wert.is_empty() {
        None
    } else {
        Some(wert.to_string())
    }
}

// ---------------------------------------------------------------------------
// Wire-Format
// ---------------------------------------------------------------------------

/// Ausgehendes Event auf dem Draht
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Umschlag {
    pub event: String,
    #[serde(default)]
    pub data: EventDaten,
}

/// Nutzdaten eines ausgehenden Events, nicht belegte Felder entfallen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDaten {
    #[serde(rename = "username", default, skip_serializing_if = "Option::is_none")]
    pub benutzername: Option<String>,
    #[serde(rename = "numUsers", default, skip_serializing_if = "Option::is_none")]
    pub anzahl: Option<usize>,
    #[serde(rename = "message", default, skip_serializing_if = "Option::is_none")]
    pub nachricht: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn roh(event: &str, data: Option<&str>) -> RohesEvent {
        RohesEvent {
            event: Some(event.to_string()),
            data: data.map(str::to_string),
        }
    }

    #[test]
    fn bekannte_event_namen_werden_zugeordnet() {
        assert_eq!(
            EingehendesEvent::from(roh("add user", Some("alice"))),
            EingehendesEvent::BenutzerHinzufuegen {
                name: "alice".into()
            }
        );
        assert_eq!(
            EingehendesEvent::from(roh("new message", Some("hi"))),
            EingehendesEvent::NeueNachricht { text: "hi".into() }
        );
    }

    #[test]
    fn unbekannter_event_name_bleibt_erhalten() {
        let event = EingehendesEvent::from(roh("typing", Some("x")));
        assert_eq!(
            event,
            EingehendesEvent::Unbekannt {
                event: "typing".into()
            }
        );
    }

    #[test]
    fn fehlender_event_name_ist_unbekannt() {
        let event = EingehendesEvent::from(RohesEvent {
            event: None,
            data: Some("ohne event".into()),
        });
        assert_eq!(
            event,
            EingehendesEvent::Unbekannt {
                event: String::new()
            }
        );
    }

    #[test]
    fn fehlende_daten_sind_leerer_string() {
        let event = EingehendesEvent::from(roh("new message", None));
        assert_eq!(event, EingehendesEvent::NeueNachricht { text: String::new() });
    }

    #[test]
    fn login_umschlag_enthaelt_nur_anzahl() {
        let umschlag = AusgehendesEvent::Login { anzahl: 3 }.umschlag();
        assert_eq!(umschlag.event, "login");
        assert_eq!(umschlag.data.anzahl, Some(3));
        assert!(umschlag.data.benutzername.is_none());
        assert!(umschlag.data.nachricht.is_none());
    }

    #[test]
    fn leerer_benutzername_wird_weggelassen() {
        let umschlag = AusgehendesEvent::NeueNachricht {
            benutzername: String::new(),
            nachricht: "hallo".into(),
        }
        .umschlag();
        assert!(umschlag.data.benutzername.is_none());
        assert_eq!(umschlag.data.nachricht.as_deref(), Some("hallo"));
    }

    #[test]
    fn event_namen_der_ausgehenden_events() {
        let verlassen = AusgehendesEvent::BenutzerVerlassen {
            benutzername: "bob".into(),
            anzahl: 0,
        };
        assert_eq!(verlassen.name(), "user left");
        // Anzahl 0 wird trotzdem uebertragen
        assert_eq!(verlassen.umschlag().data.anzahl, Some(0));

        let beigetreten = AusgehendesEvent::BenutzerBeigetreten {
            benutzername: "bob".into(),
            anzahl: 2,
        };
        assert_eq!(beigetreten.name(), "user joined");
    }
}
