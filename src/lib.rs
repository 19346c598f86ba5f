//! dnd-roller - D&D 5e attack roll bot
//!
//! Resolves attack rolls for groups of creatures against a target AC and
//! reports hits, crits, fumbles and damage over a WebSocket chat channel.

pub mod api;
pub mod bestiary;
pub mod combat;
pub mod commands;
pub mod config;
pub mod report;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use bestiary::Bestiary;
use commands::Dispatcher;
pub use config::Config;

/// The bot server instance
pub struct Server {
    config: Config,
    token: String,
    dispatcher: Arc<Dispatcher>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a server, loading the creature table from `config.creatures_path`
    pub fn new(config: Config) -> Result<Self> {
        let bestiary = Bestiary::load(&config.creatures_path)?;
        Self::with_bestiary(config, bestiary)
    }

    /// Create a server around an already-built creature table
    pub fn with_bestiary(config: Config, bestiary: Bestiary) -> Result<Self> {
        let token = config.require_token()?.to_string();
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(bestiary), &config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            token,
            dispatcher,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.dispatcher.clone(), &self.token)
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("dnd-roller listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("dnd-roller shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
