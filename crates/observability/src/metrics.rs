//! Prometheus-kompatible Metriken fuer den Chatroom
//!
//! Registrierte Metriken:
//! - `chatroom_connected_clients` – Gauge: Aktuell registrierte Verbindungen
//! - `chatroom_broadcasts_total` – Counter: Ausgefuehrte Broadcasts
//! - `chatroom_deliveries_total` – Counter: Erfolgreiche Zustellungen
//! - `chatroom_delivery_failures_total` – Counter: Fehlgeschlagene Zustellungen
//! - `chatroom_dropped_connections_total` – Counter: Wegen Fehlern entfernte Verbindungen
//! - `chatroom_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `chatroom_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit
//!
//! Die Raum-Zaehler werden nicht direkt inkrementiert, sondern beim Scrape
//! aus dem kumulierten Stand der Registry nachgezogen.

use anyhow::Result;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Kumulierter Stand eines Raums zum Zeitpunkt des Scrapes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaumStand {
    pub verbunden: usize,
    pub broadcasts: u64,
    pub zustellungen: u64,
    pub zustellfehler: u64,
    pub verworfene_verbindungen: u64,
}

/// Alle Chatroom-Prometheus-Metriken
#[derive(Clone)]
pub struct ChatroomMetrics {
    pub registry: Arc<Registry>,

    // Raum-Metriken
    pub connected_clients: IntGauge,
    pub broadcasts_total: IntCounter,
    pub deliveries_total: IntCounter,
    pub delivery_failures_total: IntCounter,
    pub dropped_connections_total: IntCounter,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl ChatroomMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Raum-Metriken ---
        let connected_clients = IntGauge::with_opts(Opts::new(
            "chatroom_connected_clients",
            "Anzahl aktuell registrierter Verbindungen",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let broadcasts_total = IntCounter::with_opts(Opts::new(
            "chatroom_broadcasts_total",
            "Gesamtanzahl ausgefuehrter Broadcasts",
        ))?;
        registry.register(Box::new(broadcasts_total.clone()))?;

        let deliveries_total = IntCounter::with_opts(Opts::new(
            "chatroom_deliveries_total",
            "Gesamtanzahl erfolgreicher Zustellungen",
        ))?;
        registry.register(Box::new(deliveries_total.clone()))?;

        let delivery_failures_total = IntCounter::with_opts(Opts::new(
            "chatroom_delivery_failures_total",
            "Gesamtanzahl fehlgeschlagener Zustellungen",
        ))?;
        registry.register(Box::new(delivery_failures_total.clone()))?;

        let dropped_connections_total = IntCounter::with_opts(Opts::new(
            "chatroom_dropped_connections_total",
            "Wegen Zustellfehlern entfernte Verbindungen",
        ))?;
        registry.register(Box::new(dropped_connections_total.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new("chatroom_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "chatroom_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            broadcasts_total,
            deliveries_total,
            delivery_failures_total,
            dropped_connections_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Uebernimmt den aktuellen Stand des Raums
    pub fn raum_aktualisieren(&self, stand: RaumStand) {
        self.connected_clients
            .set(i64::try_from(stand.verbunden).unwrap_or(i64::MAX));
        nachziehen(&self.broadcasts_total, stand.broadcasts);
        nachziehen(&self.deliveries_total, stand.zustellungen);
        nachziehen(&self.delivery_failures_total, stand.zustellfehler);
        nachziehen(&self.dropped_connections_total, stand.verworfene_verbindungen);
    }

    /// Erfasst eine abgeschlossene HTTP-Anfrage
    pub fn http_anfrage_erfassen(&self, methode: &str, pfad: &str, status: u16, dauer_sek: f64) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[methode, pfad, status.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[methode, pfad])
            .observe(dauer_sek);
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Counter auf einen kumulierten Stand bringen (nur vorwaerts)
fn nachziehen(counter: &IntCounter, stand: u64) {
    let aktuell = counter.get();
    if stand > aktuell {
        counter.inc_by(stand - aktuell);
    }
}

/// HTTP-Antwort fuer `GET /metrics`
pub fn metriken_antwort(metriken: &ChatroomMetrics) -> Response {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
