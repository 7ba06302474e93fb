//! chatroom-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod routes;
pub mod ws;

use anyhow::{Context, Result};
use axum::Router;
use chatroom_observability::{ChatroomMetrics, HealthState};
use chatroom_signaling::Chatroom;
use config::ServerConfig;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::routes::AppState;

/// Haelt den Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bindet den Listener und baut den Router
    ///
    /// Schlaegt fehl wenn der Port nicht gebunden werden kann.
    pub async fn binden(self) -> Result<GebundenerServer> {
        let adresse = self.config.bind_adresse();
        let listener = TcpListener::bind(&adresse)
            .await
            .with_context(|| format!("Listener auf {adresse} konnte nicht gebunden werden"))?;

        let chatroom = Chatroom::mit_sende_timeout(self.config.sende_timeout());
        let state = AppState {
            chatroom: chatroom.clone(),
            metriken: ChatroomMetrics::neu()?,
            health: HealthState::neu(),
            max_clients: self.config.server.max_clients,
            max_nachrichten_bytes: self.config.chat.max_nachrichten_bytes,
        };
        let app = routes::router(state, &self.config.http);

        Ok(GebundenerServer {
            listener,
            app,
            chatroom,
        })
    }

    /// Startet den Server und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %self.config.bind_adresse(),
            chat_pfad = %self.config.http.chat_pfad,
            statisch = %self.config.http.statisches_verzeichnis,
            "Server startet"
        );

        let server = self.binden().await?;
        server
            .ausfuehren(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
                    std::future::pending::<()>().await;
                }
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            })
            .await
    }
}

/// Server mit gebundenem Listener, bereit zum Ausfuehren
pub struct GebundenerServer {
    listener: TcpListener,
    app: Router,
    chatroom: Chatroom,
}

impl GebundenerServer {
    /// Tatsaechlich gebundene Adresse (relevant bei Port 0)
    pub fn lokale_adresse(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Der Chatroom dieses Servers
    pub fn chatroom(&self) -> &Chatroom {
        &self.chatroom
    }

    /// Beantwortet Anfragen bis `shutdown` fertig ist
    pub async fn ausfuehren<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let adresse = self.lokale_adresse()?;
        tracing::info!(adresse = %adresse, "Chatroom-Server gestartet");

        axum::serve(
            self.listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        tracing::info!("Chatroom-Server gestoppt");
        Ok(())
    }
}
