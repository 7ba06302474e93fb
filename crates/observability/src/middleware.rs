//! Request-Timing Middleware fuer Axum
//!
//! Misst die Antwortzeit jeder HTTP-Anfrage und protokolliert sie als
//! strukturiertes Log-Event sowie als Prometheus-Histogramm.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, Response},
    middleware::Next,
};
use std::time::Instant;

use crate::metrics::ChatroomMetrics;

/// Label fuer Anfragen ohne passende Route (statische Dateien)
const PFAD_STATISCH: &str = "statisch";

/// Erstellt den Tracing-Layer fuer HTTP-Anfragen.
pub fn request_timing_layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
> {
    use tower_http::trace::TraceLayer;
    TraceLayer::new_for_http()
}

/// Axum-Middleware-Funktion: misst Antwortzeit, loggt strukturiert und
/// erfasst die Anfrage in den Metriken.
///
/// Verwendung:
/// ```ignore
/// Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(metriken, timing_middleware))
/// ```
pub async fn timing_middleware(
    State(metriken): State<ChatroomMetrics>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    let methode = req.method().to_string();
    // Route-Muster statt konkretem Pfad, haelt die Label-Kardinalitaet klein
    let pfad = pfad_label(req.extensions().get::<MatchedPath>());
    let start = Instant::now();

    let response = next.run(req).await;

    let dauer = start.elapsed();
    let status = response.status().as_u16();

    tracing::debug!(
        method = %methode,
        path = %pfad,
        status = status,
        duration_ms = dauer.as_millis(),
        "HTTP-Anfrage abgeschlossen"
    );
    metriken.http_anfrage_erfassen(&methode, &pfad, status, dauer.as_secs_f64());

    response
}

fn pfad_label(matched: Option<&MatchedPath>) -> String {
    matched
        .map(|pfad| pfad.as_str().to_string())
        .unwrap_or_else(|| PFAD_STATISCH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohne_route_gilt_statisch() {
        assert_eq!(pfad_label(None), "statisch");
    }
}
