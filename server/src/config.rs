//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Die Umgebungsvariable `PORT` ueberschreibt den Port.

use anyhow::{bail, Context};
use chatroom_observability::{log_format_gueltig, log_level_gueltig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Umgebungsvariable fuer den Listen-Port
pub const ENV_PORT: &str = "PORT";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// HTTP-Routen und statische Dateien
    pub http: HttpEinstellungen,
    /// Chat-Einstellungen (Broadcast, Frame-Groesse)
    pub chat: ChatEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers (nur fuer Logs)
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Clients (0 = unbegrenzt)
    pub max_clients: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Chatroom".into(),
            max_clients: 0,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub bind_adresse: String,
    /// Listen-Port
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

/// HTTP-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpEinstellungen {
    /// Verzeichnis mit den statischen Dateien des Web-Clients
    pub statisches_verzeichnis: String,
    /// Pfad fuer den WebSocket-Upgrade
    pub chat_pfad: String,
}

impl Default for HttpEinstellungen {
    fn default() -> Self {
        Self {
            statisches_verzeichnis: "public".into(),
            chat_pfad: "/chat".into(),
        }
    }
}

/// Chat-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatEinstellungen {
    /// Zeitlimit fuer einen einzelnen Send in ms (0 = kein Limit)
    pub sende_timeout_ms: u64,
    /// Maximale Groesse eines eingehenden WebSocket-Frames in Bytes
    pub max_nachrichten_bytes: usize,
}

impl Default for ChatEinstellungen {
    fn default() -> Self {
        Self {
            sende_timeout_ms: 5000,
            max_nachrichten_bytes: 64 * 1024,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Uebernimmt den Port aus der Umgebung (Wert von `PORT`, falls gesetzt)
    pub fn umgebung_anwenden(&mut self, port: Option<&str>) -> anyhow::Result<()> {
        if let Some(port) = port.map(str::trim).filter(|p| !p.is_empty()) {
            self.netzwerk.port = port
                .parse()
                .with_context(|| format!("Ungueltiger Wert fuer {ENV_PORT}: '{port}'"))?;
        }
        Ok(())
    }

    /// Prueft die Konfiguration auf offensichtliche Fehler
    pub fn pruefen(&self) -> anyhow::Result<()> {
        let chat_pfad = &self.http.chat_pfad;
        if !chat_pfad.starts_with('/') || chat_pfad.len() < 2 {
            bail!("chat_pfad muss mit '/' beginnen und darf nicht '/' sein: '{chat_pfad}'");
        }
        if matches!(chat_pfad.as_str(), "/health" | "/metrics") {
            bail!("chat_pfad '{chat_pfad}' kollidiert mit einem internen Endpunkt");
        }
        if !log_level_gueltig(&self.logging.level) {
            bail!("Ungueltiges Log-Level: '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Ungueltiges Log-Format: '{}'", self.logging.format);
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Send-Zeitlimit fuer den Chatroom, `None` = unbegrenzt
    pub fn sende_timeout(&self) -> Option<Duration> {
        match self.chat.sende_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.netzwerk.port, 3000);
        assert_eq!(cfg.http.statisches_verzeichnis, "public");
        assert_eq!(cfg.http.chat_pfad, "/chat");
        assert_eq!(cfg.server.max_clients, 0);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.pruefen().is_ok());
    }

    #[test]
    fn bind_adresse() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_adresse(), "0.0.0.0:3000");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [netzwerk]
            port = 8080

            [chat]
            sende_timeout_ms = 250
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.netzwerk.port, 8080);
        assert_eq!(cfg.sende_timeout(), Some(Duration::from_millis(250)));
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.chat.max_nachrichten_bytes, 64 * 1024);
    }

    #[test]
    fn fehlende_datei_ergibt_standardwerte() {
        let cfg = ServerConfig::laden("/nicht/vorhanden/chatroom.toml").unwrap();
        assert_eq!(cfg.netzwerk.port, 3000);
    }

    #[test]
    fn kaputte_datei_ist_fehler() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("config.toml");
        std::fs::write(&pfad, "[netzwerk\nport = ").unwrap();
        assert!(ServerConfig::laden(pfad.to_str().unwrap()).is_err());
    }

    #[test]
    fn port_aus_umgebung() {
        let mut cfg = ServerConfig::default();
        cfg.umgebung_anwenden(Some("4242")).unwrap();
        assert_eq!(cfg.netzwerk.port, 4242);

        // Leer oder nicht gesetzt: unveraendert
        cfg.umgebung_anwenden(Some("")).unwrap();
        cfg.umgebung_anwenden(None).unwrap();
        assert_eq!(cfg.netzwerk.port, 4242);
    }

    #[test]
    fn ungueltiger_port_ist_fehler() {
        let mut cfg = ServerConfig::default();
        assert!(cfg.umgebung_anwenden(Some("dreitausend")).is_err());
        assert!(cfg.umgebung_anwenden(Some("70000")).is_err());
        assert_eq!(cfg.netzwerk.port, 3000);
    }

    #[test]
    fn kein_sende_timeout_bei_null() {
        let mut cfg = ServerConfig::default();
        cfg.chat.sende_timeout_ms = 0;
        assert_eq!(cfg.sende_timeout(), None);
    }

    #[test]
    fn ungueltige_werte_werden_abgelehnt() {
        let mut cfg = ServerConfig::default();
        cfg.http.chat_pfad = "chat".into();
        assert!(cfg.pruefen().is_err());

        let mut cfg = ServerConfig::default();
        cfg.http.chat_pfad = "/metrics".into();
        assert!(cfg.pruefen().is_err());

        let mut cfg = ServerConfig::default();
        cfg.logging.format = "xml".into();
        assert!(cfg.pruefen().is_err());
    }
}
