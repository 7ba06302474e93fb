//! Structured Logging Setup via tracing-subscriber
//!
//! Level und Format kommen aus der Konfiguration. Die Umgebungsvariablen
//! [`ENV_LOG_LEVEL`] und [`ENV_LOG_FORMAT`] ueberschreiben sie, leere Werte
//! zaehlen als nicht gesetzt.

use std::fmt as stdfmt;
use std::str::FromStr;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter-Direktiven, z.B. `debug` oder `info,chatroom_signaling=trace`
pub const ENV_LOG_LEVEL: &str = "CHATROOM_LOG_LEVEL";
/// `text` oder `json`
pub const ENV_LOG_FORMAT: &str = "CHATROOM_LOG_FORMAT";

const LOG_LEVEL: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    /// Eine JSON-Zeile pro Event inklusive aktuellem Span
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(wert: &str) -> Result<Self, Self::Err> {
        match wert {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            anderes => Err(format!("Unbekanntes Log-Format: {anderes}")),
        }
    }
}

impl stdfmt::Display for LogFormat {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

// ---------------------------------------------------------------------------
// Einstellungen
// ---------------------------------------------------------------------------

/// Wirksame Logging-Einstellungen nach Anwendung der Umgebung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEinstellungen {
    pub filter: String,
    pub format: LogFormat,
}

impl LogEinstellungen {
    /// Kombiniert Konfiguration und Umgebung
    ///
    /// `umgebung` liefert den Wert einer Variable. Ein ungueltiges Format
    /// faellt auf [`LogFormat::Text`] zurueck.
    pub fn aufloesen<U>(level: &str, format: &str, umgebung: U) -> Self
    where
        U: Fn(&str) -> Option<String>,
    {
        let gesetzt = |name: &str| umgebung(name).filter(|wert: &String| !wert.is_empty());

        let filter = gesetzt(ENV_LOG_LEVEL).unwrap_or_else(|| level.to_string());
        let format = gesetzt(ENV_LOG_FORMAT)
            .as_deref()
            .unwrap_or(format)
            .parse::<LogFormat>()
            .unwrap_or_default();

        Self { filter, format }
    }
}

/// Initialisiert das Logging-System.
///
/// Faellt auf `info` zurueck wenn der wirksame Filter nicht parsebar ist.
pub fn logging_initialisieren(level: &str, format: &str) {
    let einstellungen = LogEinstellungen::aufloesen(level, format, |name| std::env::var(name).ok());
    let filter =
        EnvFilter::try_new(&einstellungen.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let basis = fmt().with_env_filter(filter).with_target(true);
    match einstellungen.format {
        LogFormat::Json => basis
            .json()
            .with_thread_ids(true)
            .with_current_span(true)
            .init(),
        LogFormat::Text => basis.init(),
    }
}

/// Validiert einen Log-Level aus der Konfiguration (nur Kleinschreibung)
pub fn log_level_gueltig(level: &str) -> bool {
    LOG_LEVEL.iter().any(|l| *l == level)
}

/// Validiert ein Log-Format aus der Konfiguration
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}
