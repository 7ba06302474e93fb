//! In-Process-Transport
//!
//! [`paar`] erzeugt einen Server-seitigen Handle und die passende
//! Client-seitige [`Gegenstelle`], verbunden ueber zwei beschraenkte
//! tokio-Queues. Wird fuer eingebettete Clients und in Tests benutzt.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::verbindung::{TransportFehler, Verbindung, VerbindungsId};

/// Groesse der Queue pro Richtung
const QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// Server-Seite
// ---------------------------------------------------------------------------

/// Server-seitiger Handle eines In-Process-Clients
pub struct SpeicherVerbindung {
    id: VerbindungsId,
    /// Server -> Client
    ausgang: mpsc::Sender<String>,
    /// Client -> Server
    eingang: Mutex<mpsc::Receiver<String>>,
    /// Simulierter Transportdefekt, alle weiteren Sends schlagen fehl
    gestoert: AtomicBool,
}

impl SpeicherVerbindung {
    /// Laesst alle folgenden `senden`-Aufrufe mit einem IO-Fehler scheitern
    pub fn stoeren(&self) {
        self.gestoert.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl Verbindung for SpeicherVerbindung {
    fn id(&self) -> VerbindungsId {
        self.id
    }

    async fn senden(&self, nachricht: &str) -> Result<(), TransportFehler> {
        if self.gestoert.load(Ordering::Relaxed) {
            return Err(TransportFehler::io("Transport gestoert"));
        }
        self.ausgang
            .send(nachricht.to_string())
            .await
            .map_err(|_| TransportFehler::Geschlossen)
    }

    async fn empfangen(&self) -> Result<Option<String>, TransportFehler> {
        Ok(self.eingang.lock().await.recv().await)
    }
}

// ---------------------------------------------------------------------------
// Client-Seite
// ---------------------------------------------------------------------------

/// Client-seitiges Ende eines [`paar`]s
pub struct Gegenstelle {
    id: VerbindungsId,
    /// Client -> Server, `None` nach `schliessen`
    eingang_tx: Option<mpsc::Sender<String>>,
    /// Server -> Client
    ausgang_rx: mpsc::Receiver<String>,
}

impl Gegenstelle {
    /// Id des zugehoerigen Server-Handles
    pub fn id(&self) -> VerbindungsId {
        self.id
    }

    /// Sendet einen Frame an den Server
    pub async fn senden(&self, text: impl Into<String>) -> Result<(), TransportFehler> {
        match &self.eingang_tx {
            Some(tx) => tx
                .send(text.into())
                .await
                .map_err(|_| TransportFehler::Geschlossen),
            None => Err(TransportFehler::Geschlossen),
        }
    }

    /// Wartet auf den naechsten Frame vom Server
    ///
    /// `None` wenn der Server-Handle verworfen wurde.
    pub async fn empfangen(&mut self) -> Option<String> {
        self.ausgang_rx.recv().await
    }

    /// Liest einen bereits zugestellten Frame ohne zu warten
    pub fn try_empfangen(&mut self) -> Option<String> {
        self.ausgang_rx.try_recv().ok()
    }

    /// Schliesst die Senderichtung, der Server sieht ein geordnetes Ende
    ///
    /// Frames vom Server koennen weiterhin gelesen werden.
    pub fn schliessen(&mut self) {
        self.eingang_tx = None;
    }
}

/// Erzeugt einen verbundenen Handle mit seiner Gegenstelle
pub fn paar() -> (Arc<SpeicherVerbindung>, Gegenstelle) {
    paar_mit_kapazitaet(QUEUE_GROESSE)
}

/// Wie [`paar`], mit eigener Queue-Groesse pro Richtung
pub fn paar_mit_kapazitaet(kapazitaet: usize) -> (Arc<SpeicherVerbindung>, Gegenstelle) {
    let id = VerbindungsId::new();
    let (eingang_tx, eingang_rx) = mpsc::channel(kapazitaet);
    let (ausgang_tx, ausgang_rx) = mpsc::channel(kapazitaet);

    let verbindung = Arc::new(SpeicherVerbindung {
        id,
        ausgang: ausgang_tx,
        eingang: Mutex::new(eingang_rx),
        gestoert: AtomicBool::new(false),
    });
    let gegenstelle = Gegenstelle {
        id,
        eingang_tx: Some(eingang_tx),
        ausgang_rx,
    };
    (verbindung, gegenstelle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_in_beide_richtungen() {
        let (verbindung, mut gegenstelle) = paar();
        assert_eq!(verbindung.id(), gegenstelle.id());

        gegenstelle.senden("hallo server").await.unwrap();
        assert_eq!(
            verbindung.empfangen().await.unwrap().as_deref(),
            Some("hallo server")
        );

        verbindung.senden("hallo client").await.unwrap();
        assert_eq!(gegenstelle.empfangen().await.as_deref(), Some("hallo client"));
    }

    #[tokio::test]
    async fn schliessen_ergibt_geordnetes_ende() {
        let (verbindung, mut gegenstelle) = paar();
        gegenstelle.schliessen();
        assert_eq!(verbindung.empfangen().await, Ok(None));
        assert_eq!(
            gegenstelle.senden("zu spaet").await,
            Err(TransportFehler::Geschlossen)
        );
    }

    #[tokio::test]
    async fn senden_an_verworfene_gegenstelle_schlaegt_fehl() {
        let (verbindung, gegenstelle) = paar();
        drop(gegenstelle);
        assert_eq!(
            verbindung.senden("niemand da").await,
            Err(TransportFehler::Geschlossen)
        );
    }

    #[tokio::test]
    async fn gestoerte_verbindung() {
        let (verbindung, mut gegenstelle) = paar();
        verbindung.stoeren();
        assert!(matches!(
            verbindung.senden("x").await,
            Err(TransportFehler::Io(_))
        ));
        assert!(gegenstelle.try_empfangen().is_none());
    }
}
