mod game;

pub use game::core;
pub use game::lobby;
pub use game::messages;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::Response,
    routing::get,
};
use game::lobby::LobbyState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

async fn health() -> &'static str {
    "ok"
}

#[derive(Clone)]
pub struct AppState {
    pub lobby: Arc<LobbyState>,
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    game::handle_connection(socket, state.lobby).await;
}

pub fn app() -> Router {
    app_with_config(None)
}

/// Build the router, optionally overriding the (vote timeout, results
/// display delay) pair. Tests shrink both to keep runs fast.
pub fn app_with_config(timeouts: Option<(Duration, Duration)>) -> Router {
    let mut lobby = LobbyState::new();
    if let Some((vote_timeout, results_delay)) = timeouts {
        lobby = lobby.with_timeouts(vote_timeout, results_delay);
    }
    let state = AppState {
        lobby: Arc::new(lobby),
    };

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
