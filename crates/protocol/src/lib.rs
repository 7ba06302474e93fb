//! chatroom-protocol – Wire-Format des Chatrooms
//!
//! Dieses Crate definiert die Events die zwischen Browser-Client und Server
//! ueber den WebSocket ausgetauscht werden, sowie den JSON-Codec dafuer.
//!
//! ```text
//! Client -> Server   {"event": "add user", "data": "alice"}
//! Server -> Client   {"event": "login", "data": {"numUsers": 1}}
//! ```

pub mod codec;
pub mod events;

pub use codec::{dekodieren, kodieren, umschlag_dekodieren, ProtokollFehler};
pub use events::{AusgehendesEvent, EingehendesEvent, EventDaten, Umschlag};
