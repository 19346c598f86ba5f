//! WebSocket handler - the bot's chat channel

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use super::AppState;
use crate::commands::Reply;
use crate::report::{AttackReport, ReportField};

/// Connection manager for all active WebSocket sessions
#[derive(Default)]
pub struct ConnectionManager {
    sessions: RwLock<HashMap<String, mpsc::Sender<ServerMessage>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session
    pub async fn register(&self, session_id: String, sender: mpsc::Sender<ServerMessage>) {
        self.sessions.write().await.insert(session_id, sender);
    }

    /// Remove a session
    pub async fn unregister(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Number of connected sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Send a message to a specific session
    pub async fn send_to(&self, session_id: &str, msg: ServerMessage) {
        let sender = self.sessions.read().await.get(session_id).cloned();
        if let Some(sender) = sender {
            if sender.send(msg).await.is_err() {
                warn!("Failed to send message to session {}", session_id);
            }
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Welcome message on connect
    #[serde(rename = "welcome")]
    Welcome { session_id: String },
    /// Plain text reply
    #[serde(rename = "output")]
    Output { text: String },
    /// Attack report, with a plain-text rendering for simple clients
    #[serde(rename = "report")]
    Report {
        title: String,
        description: String,
        fields: Vec<ReportField>,
        text: String,
    },
    /// User-facing error
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "pong")]
    Pong,
}

impl From<AttackReport> for ServerMessage {
    fn from(report: AttackReport) -> Self {
        let text = report.render_text();
        ServerMessage::Report {
            title: report.title,
            description: report.description,
            fields: report.fields,
            text,
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Chat message, possibly a command
    #[serde(rename = "command")]
    Command { text: String },
    /// Ping to keep connection alive
    #[serde(rename = "ping")]
    Ping,
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// Handle WebSocket upgrade; the bot token must be passed as `?token=`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Response {
    if params.token.as_deref() != Some(state.token.as_ref()) {
        warn!("Rejected WebSocket connection with bad token");
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);
    let session_id = uuid::Uuid::new_v4().to_string();

    info!("WebSocket connected: {}", session_id);
    state.connections.register(session_id.clone(), tx).await;

    let welcome = ServerMessage::Welcome {
        session_id: session_id.clone(),
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(json.into())).await;
    }

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handle_client_message(&state, &session_id, client_msg).await
                            }
                            Err(e) => {
                                let msg = ServerMessage::Error {
                                    message: format!("Malformed message: {}", e),
                                };
                                state.connections.send_to(&session_id, msg).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    state.connections.unregister(&session_id).await;
    info!("WebSocket disconnected: {}", session_id);
}

/// Handle a message from the client
async fn handle_client_message(state: &AppState, session_id: &str, msg: ClientMessage) {
    match msg {
        ClientMessage::Command { text } => {
            let Some(result) = state.dispatcher.dispatch(&text) else {
                return;
            };
            info!("Session {} command: {}", session_id, text);

            let response = match result {
                Ok(Reply::Report(report)) => report.into(),
                Ok(Reply::Text(text)) => ServerMessage::Output { text },
                Err(e) => {
                    info!("Session {} command rejected: {}", session_id, e);
                    ServerMessage::Error {
                        message: format!("❌ {}", e),
                    }
                }
            };
            state.connections.send_to(session_id, response).await;
        }
        ClientMessage::Ping => {
            state.connections.send_to(session_id, ServerMessage::Pong).await;
        }
    }
}
