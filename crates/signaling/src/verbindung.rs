//! Verbindungs-Abstraktion
//!
//! Eine [`Verbindung`] ist der Handle auf genau einen Client. Die Registry
//! benutzt nur `id` und `senden`, die Session zusaetzlich `empfangen`.
//! Implementierungen: WebSocket (im Server-Crate) und
//! [`SpeicherVerbindung`](crate::speicher::SpeicherVerbindung).

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// VerbindungsId
// ---------------------------------------------------------------------------

/// Identitaet eines Handles
///
/// Zwei Handles sind genau dann gleich, wenn ihre Ids gleich sind. Die Id
/// wird beim Erzeugen des Handles vergeben und nie wiederverwendet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerbindungsId(pub Uuid);

impl VerbindungsId {
    /// Erstellt eine neue zufaellige VerbindungsId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VerbindungsId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VerbindungsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TransportFehler
// ---------------------------------------------------------------------------

/// Fehler auf Transportebene, immer auf einen Handle bezogen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFehler {
    /// Gegenstelle ist nicht mehr erreichbar
    #[error("Verbindung geschlossen")]
    Geschlossen,

    /// Senden hat das Zeitlimit ueberschritten
    #[error("Zeitlimit beim Senden ueberschritten")]
    Zeitlimit,

    /// Fehler des darunterliegenden Transports
    #[error("Transportfehler: {0}")]
    Io(String),
}

impl TransportFehler {
    /// Erstellt einen Transportfehler aus einer beliebigen Fehlermeldung
    pub fn io(fehler: impl fmt::Display) -> Self {
        Self::Io(fehler.to_string())
    }
}

// ---------------------------------------------------------------------------
// Verbindung
// ---------------------------------------------------------------------------

/// Bidirektionaler Kanal zu einem Client
///
/// `senden` kann parallel zu `empfangen` aufgerufen werden (Broadcasts
/// anderer Sessions laufen waehrend die eigene Session auf den naechsten
/// Frame wartet).
#[async_trait]
pub trait Verbindung: Send + Sync {
    /// Identitaet des Handles
    fn id(&self) -> VerbindungsId;

    /// Sendet einen Textframe, wartet ggf. auf Backpressure des Transports
    async fn senden(&self, nachricht: &str) -> Result<(), TransportFehler>;

    /// Wartet auf den naechsten Textframe
    ///
    /// `Ok(None)` bedeutet, dass die Gegenstelle die Verbindung geordnet
    /// geschlossen hat.
    async fn empfangen(&self) -> Result<Option<String>, TransportFehler>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_sind_eindeutig() {
        let a = VerbindungsId::new();
        let b = VerbindungsId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn id_anzeige_hat_praefix() {
        let id = VerbindungsId::new();
        assert!(id.to_string().starts_with("conn:"));
    }

    #[test]
    fn io_fehler_uebernimmt_meldung() {
        let fehler = TransportFehler::io("broken pipe");
        assert_eq!(fehler.to_string(), "Transportfehler: broken pipe");
    }
}
