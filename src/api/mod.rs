//! HTTP API module - REST endpoints and the WebSocket chat channel

mod websocket;

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::commands::Dispatcher;
pub use websocket::{ClientMessage, ConnectionManager, ServerMessage};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub connections: Arc<ConnectionManager>,
    /// Token clients must present on connect
    pub token: Arc<str>,
}

/// Build the API router
pub fn router(dispatcher: Arc<Dispatcher>, token: &str) -> Router {
    let state = AppState {
        dispatcher,
        connections: Arc::new(ConnectionManager::new()),
        token: Arc::from(token),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/creatures", get(creatures))
        .route("/ws", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "dnd-roller",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        creatures: state.dispatcher.bestiary().len(),
        sessions: state.connections.len().await,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    creatures: usize,
    sessions: usize,
}

/// The loaded creature table, in the same shape as the creature file
async fn creatures(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dispatcher.bestiary().to_json_value())
}
