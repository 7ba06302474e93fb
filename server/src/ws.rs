//! WebSocket-Transport
//!
//! Adaptiert einen von axum geupgradeten `WebSocket` an den
//! [`Verbindung`]-Trait. Sende- und Empfangsrichtung sind getrennt gelockt,
//! damit Broadcasts anderer Sessions nicht auf das naechste eingehende
//! Frame warten muessen.

use async_trait::async_trait;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use chatroom_signaling::{TransportFehler, Verbindung, VerbindungsId};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;

/// Server-seitiger Handle auf einen WebSocket-Client
pub struct WsVerbindung {
    id: VerbindungsId,
    sender: Mutex<SplitSink<WebSocket, Message>>,
    empfaenger: Mutex<SplitStream<WebSocket>>,
}

impl WsVerbindung {
    /// Erstellt einen Handle mit neuer Id
    pub fn neu(socket: WebSocket) -> Self {
        let (sender, empfaenger) = socket.split();
        let id = VerbindungsId::new();
        tracing::debug!(verbindung = %id, "WebSocket verbunden");
        Self {
            id,
            sender: Mutex::new(sender),
            empfaenger: Mutex::new(empfaenger),
        }
    }

    /// Schliesst den Socket mit Close-Code 1013 (spaeter erneut versuchen)
    pub async fn abweisen(&self, grund: &'static str) {
        let frame = CloseFrame {
            code: close_code::AGAIN,
            reason: grund.into(),
        };
        if let Err(e) = self.sender.lock().await.send(Message::Close(Some(frame))).await {
            tracing::debug!(verbindung = %self.id, fehler = %e, "Close-Frame nicht gesendet");
        }
    }
}

#[async_trait]
impl Verbindung for WsVerbindung {
    fn id(&self) -> VerbindungsId {
        self.id
    }

    async fn senden(&self, nachricht: &str) -> Result<(), TransportFehler> {
        self.sender
            .lock()
            .await
            .send(Message::Text(nachricht.to_string()))
            .await
            .map_err(TransportFehler::io)
    }

    async fn empfangen(&self) -> Result<Option<String>, TransportFehler> {
        let mut empfaenger = self.empfaenger.lock().await;
        while let Some(frame) = empfaenger.next().await {
            match frame.map_err(TransportFehler::io)? {
                Message::Text(text) => return Ok(Some(text)),
                // Binaerframes werden wie Text behandelt
                Message::Binary(daten) => {
                    return Ok(Some(String::from_utf8_lossy(&daten).into_owned()))
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => return Ok(None),
            }
        }
        Ok(None)
    }
}
