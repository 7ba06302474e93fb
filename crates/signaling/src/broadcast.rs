//! Chatroom – Registry aller verbundenen Clients mit Broadcast
//!
//! Alle Operationen laufen unter einem einzigen `tokio::sync::Mutex`, der bei
//! einem Broadcast ueber die gesamte Iteration (inklusive der Sends) gehalten
//! wird. Jeder Broadcast sieht dadurch einen konsistenten Mitgliederstand,
//! parallele `hinzufuegen`/`entfernen`-Aufrufe warten bis er fertig ist.
//!
//! ## Teilausfaelle
//! Ein fehlgeschlagener Send bricht den Broadcast nicht ab. Der betroffene
//! Handle wird im [`BroadcastBericht`] gemeldet und noch im selben
//! kritischen Abschnitt aus der Registry entfernt. Jeder Send ist durch
//! `sende_timeout` begrenzt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::verbindung::{TransportFehler, Verbindung, VerbindungsId};

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Standard-Zeitlimit fuer einen einzelnen Send
pub const STANDARD_SENDE_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// BroadcastBericht
// ---------------------------------------------------------------------------

/// Fehlgeschlagene Zustellung an einen Handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZustellFehler {
    pub verbindung: VerbindungsId,
    pub fehler: TransportFehler,
}

/// Ergebnis eines Broadcasts
#[derive(Debug, Clone, Default)]
pub struct BroadcastBericht {
    /// Anzahl erfolgreicher Zustellungen
    pub zugestellt: usize,
    /// Alle fehlgeschlagenen Zustellungen in Iterationsreihenfolge
    pub fehler: Vec<ZustellFehler>,
}

impl BroadcastBericht {
    /// `true` wenn jede Zustellung gelungen ist
    pub fn ist_vollstaendig(&self) -> bool {
        self.fehler.is_empty()
    }

    /// Zuletzt aufgetretener Fehler
    pub fn letzter_fehler(&self) -> Option<&ZustellFehler> {
        self.fehler.last()
    }

    fn enthaelt_fehler_fuer(&self, id: VerbindungsId) -> bool {
        self.fehler.iter().any(|f| f.verbindung == id)
    }
}

// ---------------------------------------------------------------------------
// Statistik
// ---------------------------------------------------------------------------

/// Kumulierte Zaehler seit Erzeugung des Chatrooms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistik {
    pub broadcasts: u64,
    pub zustellungen: u64,
    pub zustellfehler: u64,
    pub verworfene_verbindungen: u64,
}

#[derive(Default)]
struct Zaehler {
    broadcasts: AtomicU64,
    zustellungen: AtomicU64,
    zustellfehler: AtomicU64,
    verworfene_verbindungen: AtomicU64,
}

// ---------------------------------------------------------------------------
// Chatroom
// ---------------------------------------------------------------------------

/// Registry aller verbundenen Clients eines Raums
///
/// Clone teilt den inneren Zustand. Wird explizit erzeugt und jeder Session
/// beim Start uebergeben.
#[derive(Clone)]
pub struct Chatroom {
    inner: Arc<ChatroomInner>,
}

struct ChatroomInner {
    /// Registrierte Handles in Einfuegereihenfolge, jede Id hoechstens einmal
    verbindungen: Mutex<Vec<Arc<dyn Verbindung>>>,
    /// `None` = Sends ohne Zeitlimit
    sende_timeout: Option<Duration>,
    zaehler: Zaehler,
}

impl Chatroom {
    /// Erstellt einen leeren Chatroom mit [`STANDARD_SENDE_TIMEOUT`]
    pub fn neu() -> Self {
        Self::mit_sende_timeout(Some(STANDARD_SENDE_TIMEOUT))
    }

    /// Erstellt einen leeren Chatroom mit eigenem Send-Zeitlimit
    pub fn mit_sende_timeout(sende_timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(ChatroomInner {
                verbindungen: Mutex::new(Vec::new()),
                sende_timeout,
                zaehler: Zaehler::default(),
            }),
        }
    }

    /// Registriert einen Handle
    ///
    /// Gibt `false` zurueck wenn die Id bereits registriert war, die
    /// Registry bleibt dann unveraendert.
    pub async fn hinzufuegen(&self, verbindung: Arc<dyn Verbindung>) -> bool {
        self.hinzufuegen_begrenzt(verbindung, 0).await
    }

    /// Registriert einen Handle nur solange weniger als `max` registriert sind
    ///
    /// `max == 0` bedeutet unbegrenzt. Pruefung und Einfuegen laufen unter
    /// demselben Lock, parallele Aufrufe koennen das Limit nicht ueberschreiten.
    pub async fn hinzufuegen_begrenzt(&self, verbindung: Arc<dyn Verbindung>, max: usize) -> bool {
        let id = verbindung.id();
        let mut verbindungen = self.inner.verbindungen.lock().await;
        if verbindungen.iter().any(|v| v.id() == id) {
            tracing::debug!(verbindung = %id, "Verbindung bereits registriert");
            return false;
        }
        if max > 0 && verbindungen.len() >= max {
            tracing::debug!(verbindung = %id, max, "Chatroom voll");
            return false;
        }
        verbindungen.push(verbindung);
        tracing::debug!(verbindung = %id, anzahl = verbindungen.len(), "Verbindung registriert");
        true
    }

    /// Entfernt den Handle mit der gegebenen Id
    ///
    /// Kein Fehler wenn die Id nicht (mehr) registriert ist.
    pub async fn entfernen(&self, id: VerbindungsId) -> bool {
        let mut verbindungen = self.inner.verbindungen.lock().await;
        match verbindungen.iter().position(|v| v.id() == id) {
            Some(index) => {
                verbindungen.remove(index);
                tracing::debug!(verbindung = %id, anzahl = verbindungen.len(), "Verbindung entfernt");
                true
            }
            None => false,
        }
    }

    /// Anzahl registrierter Handles (nur eine Momentaufnahme)
    pub async fn anzahl(&self) -> usize {
        self.inner.verbindungen.lock().await.len()
    }

    /// Anzahl registrierter Handles ohne den gegebenen
    pub async fn anzahl_ohne(&self, id: VerbindungsId) -> usize {
        self.inner
            .verbindungen
            .lock()
            .await
            .iter()
            .filter(|v| v.id() != id)
            .count()
    }

    /// Prueft ob ein Handle registriert ist
    pub async fn ist_registriert(&self, id: VerbindungsId) -> bool {
        self.inner
            .verbindungen
            .lock()
            .await
            .iter()
            .any(|v| v.id() == id)
    }

    /// Sendet eine Nachricht an alle registrierten Handles ausser einem
    ///
    /// Fehlgeschlagene Handles werden gemeldet und aus der Registry entfernt.
    pub async fn an_alle_ausser_senden(
        &self,
        nachricht: &str,
        ausgeschlossen: VerbindungsId,
    ) -> BroadcastBericht {
        let mut verbindungen = self.inner.verbindungen.lock().await;
        let mut bericht = BroadcastBericht::default();

        tracing::debug!(
            absender = %ausgeschlossen,
            mitglieder = verbindungen.len(),
            "Broadcast"
        );

        for verbindung in verbindungen.iter() {
            let id = verbindung.id();
            if id == ausgeschlossen {
                continue;
            }
            match self.direkt_senden(verbindung.as_ref(), nachricht).await {
                Ok(()) => bericht.zugestellt += 1,
                Err(fehler) => {
                    tracing::warn!(verbindung = %id, fehler = %fehler, "Zustellung fehlgeschlagen");
                    bericht.fehler.push(ZustellFehler {
                        verbindung: id,
                        fehler,
                    });
                }
            }
        }

        if !bericht.ist_vollstaendig() {
            let vorher = verbindungen.len();
            verbindungen.retain(|v| !bericht.enthaelt_fehler_fuer(v.id()));
            let verworfen = (vorher - verbindungen.len()) as u64;
            self.inner
                .zaehler
                .verworfene_verbindungen
                .fetch_add(verworfen, Ordering::Relaxed);
            tracing::info!(verworfen, "Defekte Verbindungen aus dem Chatroom entfernt");
        }

        let zaehler = &self.inner.zaehler;
        zaehler.broadcasts.fetch_add(1, Ordering::Relaxed);
        zaehler
            .zustellungen
            .fetch_add(bericht.zugestellt as u64, Ordering::Relaxed);
        zaehler
            .zustellfehler
            .fetch_add(bericht.fehler.len() as u64, Ordering::Relaxed);

        bericht
    }

    /// Sendet an einen einzelnen Handle mit dem Send-Zeitlimit des Raums
    ///
    /// Nimmt den Registry-Lock nicht und aendert die Mitgliedschaft nicht.
    pub async fn direkt_senden(
        &self,
        verbindung: &dyn Verbindung,
        nachricht: &str,
    ) -> Result<(), TransportFehler> {
        match self.inner.sende_timeout {
            Some(dauer) => tokio::time::timeout(dauer, verbindung.senden(nachricht))
                .await
                .unwrap_or(Err(TransportFehler::Zeitlimit)),
            None => verbindung.senden(nachricht).await,
        }
    }

    /// Momentaufnahme der kumulierten Zaehler
    pub fn statistik(&self) -> Statistik {
        let zaehler = &self.inner.zaehler;
        Statistik {
            broadcasts: zaehler.broadcasts.load(Ordering::Relaxed),
            zustellungen: zaehler.zustellungen.load(Ordering::Relaxed),
            zustellfehler: zaehler.zustellfehler.load(Ordering::Relaxed),
            verworfene_verbindungen: zaehler.verworfene_verbindungen.load(Ordering::Relaxed),
        }
    }
}

impl Default for Chatroom {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
