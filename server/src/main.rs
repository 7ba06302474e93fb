//! Chatroom Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.
//! Beendet sich mit Exit-Code ungleich 0 wenn der Port nicht gebunden
//! werden kann.

use anyhow::Result;
use chatroom_observability::logging_initialisieren;
use chatroom_server::{config::ServerConfig, config::ENV_PORT, Server};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("CHATROOM_CONFIG").unwrap_or_else(|_| "config.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let mut config = ServerConfig::laden(&config_pfad)?;
    config.umgebung_anwenden(std::env::var(ENV_PORT).ok().as_deref())?;
    config.pruefen()?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Chatroom Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
