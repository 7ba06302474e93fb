//! JSON-Codec fuer WebSocket-Textframes
//!
//! Ein Frame enthaelt genau ein Event. Der Codec ist zustandslos, die
//! Frame-Grenzen liefert der Transport.

use thiserror::Error;

use crate::events::{AusgehendesEvent, EingehendesEvent, RohesEvent, Umschlag};

/// Fehler beim Kodieren oder Dekodieren eines Events
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    /// Eingehender Frame ist kein gueltiges Event
    #[error("Ungueltiges Event: {0}")]
    Dekodierung(#[source] serde_json::Error),

    /// Ausgehendes Event konnte nicht serialisiert werden
    #[error("Serialisierung fehlgeschlagen: {0}")]
    Kodierung(#[source] serde_json::Error),
}

/// Dekodiert einen eingehenden Frame
///
/// Unbekannte Event-Namen sind kein Fehler, sondern ergeben
/// [`EingehendesEvent::Unbekannt`].
pub fn dekodieren(text: &str) -> Result<EingehendesEvent, ProtokollFehler> {
    let roh: RohesEvent = serde_json::from_str(text).map_err(ProtokollFehler::Dekodierung)?;
    Ok(roh.into())
}

/// Kodiert ein ausgehendes Event als JSON-Text
pub fn kodieren(event: &AusgehendesEvent) -> Result<String, ProtokollFehler> {
    serde_json::to_string(&event.umschlag()).map_err(ProtokollFehler::Kodierung)
}

/// Dekodiert einen vom Server gesendeten Frame (Client-Seite)
pub fn umschlag_dekodieren(text: &str) -> Result<Umschlag, ProtokollFehler> {
    serde_json::from_str(text).map_err(ProtokollFehler::Dekodierung)
}
