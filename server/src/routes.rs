//! HTTP-Routen des Chatroom-Servers
//!
//! - `GET <chat_pfad>` – WebSocket-Upgrade, startet eine Session
//! - `GET /health`     – Health-Check JSON
//! - `GET /metrics`    – Prometheus scrape format
//! - alles andere      – statische Dateien des Web-Clients

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chatroom_observability::{
    metriken_antwort, request_timing_layer, timing_middleware, ChatroomMetrics, HealthState,
    RaumStand,
};
use chatroom_signaling::{Chatroom, Session};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::Instrument;

use crate::config::HttpEinstellungen;
use crate::ws::WsVerbindung;

/// Axum-State des Chatroom-Servers
#[derive(Clone)]
pub struct AppState {
    pub chatroom: Chatroom,
    pub metriken: ChatroomMetrics,
    pub health: HealthState,
    /// 0 = unbegrenzt
    pub max_clients: usize,
    pub max_nachrichten_bytes: usize,
}

/// Baut den vollstaendigen Router
pub fn router(state: AppState, http: &HttpEinstellungen) -> Router {
    let statisch = ServeDir::new(&http.statisches_verzeichnis);

    Router::new()
        .route(&http.chat_pfad, get(chat_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback_service(statisch)
        .layer(middleware::from_fn_with_state(
            state.metriken.clone(),
            timing_middleware,
        ))
        .layer(request_timing_layer())
        .with_state(state)
}

/// `GET <chat_pfad>` – WebSocket-Upgrade
async fn chat_handler(
    ws: WebSocketUpgrade,
    peer: Option<ConnectInfo<SocketAddr>>,
    State(state): State<AppState>,
) -> Response {
    let peer = peer.map(|ConnectInfo(addr)| addr);

    if state.max_clients > 0 && state.chatroom.anzahl().await >= state.max_clients {
        tracing::warn!(
            peer = ?peer,
            max = state.max_clients,
            "Chatroom voll – Verbindung abgelehnt"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Chatroom ist voll").into_response();
    }

    // Die Pruefung oben ist nur ein schneller Pfad ohne Handshake. Verbindlich
    // ist das Limit erst beim Registrieren unter dem Chatroom-Lock.
    ws.max_message_size(state.max_nachrichten_bytes)
        .on_upgrade(move |socket| {
            async move {
                let verbindung = Arc::new(WsVerbindung::neu(socket));
                match Session::beitreten(state.chatroom, verbindung.clone(), state.max_clients)
                    .await
                {
                    Some(mut session) => {
                        session.verarbeiten().await;
                    }
                    None => {
                        tracing::warn!(
                            max = state.max_clients,
                            "Chatroom voll – Verbindung nach Upgrade geschlossen"
                        );
                        verbindung.abweisen("Chatroom ist voll").await;
                    }
                }
            }
            .instrument(tracing::info_span!("ws", peer = ?peer))
        })
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let teilnehmer = state.chatroom.anzahl().await;
    state.health.antwort(teilnehmer, state.max_clients)
}

/// `GET /metrics` – Raum-Stand uebernehmen und exportieren
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let statistik = state.chatroom.statistik();
    state.metriken.raum_aktualisieren(RaumStand {
        verbunden: state.chatroom.anzahl().await,
        broadcasts: statistik.broadcasts,
        zustellungen: statistik.zustellungen,
        zustellfehler: statistik.zustellfehler,
        verworfene_verbindungen: statistik.verworfene_verbindungen,
    });
    metriken_antwort(&state.metriken)
}
