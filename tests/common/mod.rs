//! Common test utilities - BotTest harness for end-to-end testing

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dnd_roller::bestiary::Bestiary;
use dnd_roller::{Config, Server};
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

pub const TEST_TOKEN: &str = "test-token";

pub const CREATURES: &str = r#"{
    "Wolf": {
        "default_action": "bite",
        "actions": {
            "bite": { "attack_bonus": 4, "damage": { "count": 2, "sides": 4, "bonus": 2 } }
        }
    },
    "Brown Bear": {
        "default_action": "Claws",
        "actions": {
            "Bite": { "attack_bonus": 5, "damage": { "count": 1, "sides": 8, "bonus": 4 } },
            "Claws": { "attack_bonus": 5, "damage": { "count": 2, "sides": 6, "bonus": 4 } }
        }
    }
}"#;

/// Test harness that spawns a real bot server on a random port
pub struct BotTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl BotTest {
    /// Start a new test server with the default test creatures
    pub async fn start() -> Result<Self> {
        Self::start_with(Config::default()).await
    }

    /// Start a test server from `config`; address and token are filled in
    pub async fn start_with(mut config: Config) -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        config.bind_addr = addr;
        config.token = Some(TEST_TOKEN.to_string());

        let bestiary = Bestiary::from_json_str(CREATURES)?;
        let server = Arc::new(Server::with_bestiary(config, bestiary)?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }

    /// Get the WebSocket URL with auth token
    pub fn ws_url_with_token(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }

    /// Connect with the test token and consume the welcome message
    pub async fn connect_ws(&self) -> Result<WsClient> {
        let mut client = self.connect_ws_with_token(TEST_TOKEN).await?;
        let welcome = client.recv_json_timeout(Duration::from_secs(5)).await?;
        anyhow::ensure!(welcome["type"] == "welcome", "expected welcome, got {}", welcome);
        Ok(client)
    }

    /// Connect with an arbitrary token
    pub async fn connect_ws_with_token(&self, token: &str) -> Result<WsClient> {
        let (ws_stream, _) = connect_async(self.ws_url_with_token(token)).await?;
        let (write, read) = ws_stream.split();
        Ok(WsClient { write, read })
    }
}

/// WebSocket client for testing
pub struct WsClient {
    write: futures_util::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        Message,
    >,
    read: futures_util::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    >,
}

impl WsClient {
    /// Send a command message
    pub async fn send_command(&mut self, text: &str) -> Result<()> {
        let msg = serde_json::json!({
            "type": "command",
            "text": text
        });
        self.write
            .send(Message::Text(msg.to_string().into()))
            .await?;
        Ok(())
    }

    /// Send a ping message
    pub async fn send_ping(&mut self) -> Result<()> {
        let msg = serde_json::json!({
            "type": "ping"
        });
        self.write
            .send(Message::Text(msg.to_string().into()))
            .await?;
        Ok(())
    }

    /// Send raw text, bypassing the JSON envelope
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.write
            .send(Message::Text(text.to_string().into()))
            .await?;
        Ok(())
    }

    /// Receive the next message as JSON
    pub async fn recv_json(&mut self) -> Result<serde_json::Value> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    anyhow::bail!("WebSocket closed");
                }
                _ => continue, // Skip binary/ping/pong frames
            }
        }
    }

    /// Receive with timeout
    pub async fn recv_json_timeout(&mut self, timeout: Duration) -> Result<serde_json::Value> {
        match tokio::time::timeout(timeout, self.recv_json()).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!("Timeout waiting for WebSocket message"),
        }
    }

    /// Send a command and wait for its reply
    pub async fn command(&mut self, text: &str) -> Result<serde_json::Value> {
        self.send_command(text).await?;
        self.recv_json_timeout(Duration::from_secs(5)).await
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        self.write.close().await?;
        Ok(())
    }
}

impl Drop for BotTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
