//! # chatroom-observability
//!
//! Observability-Crate fuer den Chatroom:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Antwort (`/health`)
//! - Structured Logging via tracing-subscriber
//! - Request-Timing Middleware

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{HealthResponse, HealthState, HealthStatus};
pub use logging::{
    log_format_gueltig, log_level_gueltig, logging_initialisieren, LogEinstellungen, LogFormat,
};
pub use metrics::{metriken_antwort, ChatroomMetrics, RaumStand};
pub use middleware::{request_timing_layer, timing_middleware};
