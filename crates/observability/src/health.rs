//! Health-Check fuer den Chatroom
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und Teilnehmerzahl

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Raum ist voll, neue Verbindungen werden abgelehnt
    Degraded,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub teilnehmer: usize,
}

/// Geteilter Zustand fuer den Health-Check
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
}

impl HealthState {
    pub fn neu() -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Baut die Antwort fuer die aktuelle Teilnehmerzahl
    ///
    /// `max_clients == 0` bedeutet unbegrenzt.
    pub fn antwort(&self, teilnehmer: usize, max_clients: usize) -> HealthResponse {
        let voll = max_clients > 0 && teilnehmer >= max_clients;
        HealthResponse {
            status: if voll {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            teilnehmer,
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::neu()
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> axum::response::Response {
        // 200 auch bei degraded (Probe soll nicht failen)
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_state_uptime_frisch() {
        let state = HealthState::neu();
        assert!(state.uptime_seconds() < 5);
    }

    #[test]
    fn unbegrenzter_raum_ist_healthy() {
        let antwort = HealthState::neu().antwort(1000, 0);
        assert_eq!(antwort.status, HealthStatus::Healthy);
        assert_eq!(antwort.teilnehmer, 1000);
    }

    #[test]
    fn voller_raum_ist_degraded() {
        let state = HealthState::neu();
        assert_eq!(state.antwort(9, 10).status, HealthStatus::Healthy);
        assert_eq!(state.antwort(10, 10).status, HealthStatus::Degraded);
    }

    #[test]
    fn health_response_serialisierung() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            uptime_seconds: 3600,
            teilnehmer: 3,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"version\":\"0.1.0\""));
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("\"teilnehmer\":3"));
    }

    #[test]
    fn health_response_deserialisierung() {
        let json = r#"{"status":"degraded","version":"0.1.0","uptime_seconds":100,"teilnehmer":10}"#;
        let response: HealthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(response.teilnehmer, 10);
    }
}
