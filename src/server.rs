//! TCP Server
//!
//! Owns the listener, the storage engine and the expiry sweeper. Each
//! accepted connection is served by its own task. When the shutdown future
//! resolves, the server stops accepting and waits for the sweeper to exit.

use crate::commands::CommandHandler;
use crate::config::Config;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::{ExpiryConfig, ExpirySweeper, StorageEngine};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// A bound server, ready to run.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
    expiry: ExpiryConfig,
}

impl Server {
    /// Binds to the configured address.
    pub async fn bind(config: &Config) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        Ok(Self::from_listener(listener, config))
    }

    /// Wraps an already bound listener.
    pub fn from_listener(listener: TcpListener, config: &Config) -> Self {
        Self {
            listener,
            storage: Arc::new(StorageEngine::with_default_ttl(config.default_ttl())),
            stats: Arc::new(ConnectionStats::new()),
            expiry: config.expiry_config(),
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The store shared by every connection.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    pub fn stats(&self) -> &Arc<ConnectionStats> {
        &self.stats
    }

    /// Serves connections until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let Server {
            listener,
            storage,
            stats,
            expiry,
        } = self;

        let sweeper = ExpirySweeper::start(Arc::clone(&storage), expiry);

        if let Ok(addr) = listener.local_addr() {
            info!(address = %addr, "Listening for connections");
        }

        tokio::select! {
            _ = accept_loop(listener, storage, stats) => {}
            _ = shutdown => {
                info!("Shutdown signal received, stopping server...");
            }
        }

        sweeper.shutdown().await;
        info!("Server shutdown complete");
    }
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(&storage));
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
