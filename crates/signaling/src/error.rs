//! Fehlertypen fuer den Signaling-Service

use chatroom_protocol::ProtokollFehler;
use thiserror::Error;

use crate::verbindung::TransportFehler;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Senden oder Empfangen auf einer Verbindung fehlgeschlagen
    #[error("Transport: {0}")]
    Transport(#[from] TransportFehler),

    /// Event konnte nicht dekodiert oder kodiert werden
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtokollFehler),
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
