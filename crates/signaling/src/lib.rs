//! chatroom-signaling – Registry, Broadcast und Session-Protokoll
//!
//! ## Architektur
//!
//! ```text
//! Transport (WebSocket / In-Process)
//!     |
//!     v
//! Session (pro Verbindung ein Task)
//!     |  State Machine: Verbunden -> Benannt -> Geschlossen
//!     |
//!     v
//! Chatroom (geteilte Registry, ein Mutex)
//!     +-- hinzufuegen / entfernen / anzahl
//!     +-- an_alle_ausser_senden -> BroadcastBericht
//! ```

pub mod broadcast;
pub mod error;
pub mod session;
pub mod speicher;
pub mod verbindung;

// Bequeme Re-Exporte
pub use broadcast::{BroadcastBericht, Chatroom, Statistik, ZustellFehler};
pub use error::{SignalingError, SignalingResult};
pub use session::{Session, SessionEnde, SessionZustand};
pub use verbindung::{TransportFehler, Verbindung, VerbindungsId};
