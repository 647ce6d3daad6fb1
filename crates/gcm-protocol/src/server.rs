//! TCP accept loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use gcm_core::config::ServerConfig;
use gcm_core::{AppError, AppResult};

use crate::connection::{ClientConnection, ConnectionPool};
use crate::registry::HandlerRegistry;

/// Accepts clients and runs one task per connection.
#[derive(Debug)]
pub struct TcpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<HandlerRegistry>,
    pool: Arc<ConnectionPool>,
    connections: TaskTracker,
    shutdown: CancellationToken,
    max_frame_bytes: usize,
    shutdown_grace: Duration,
}

impl TcpServer {
    /// Bind the configured address.
    pub async fn bind(
        config: &ServerConfig,
        registry: Arc<HandlerRegistry>,
        shutdown: CancellationToken,
    ) -> AppResult<Self> {
        let address = config.bind_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            AppError::with_source(
                gcm_core::ErrorKind::Configuration,
                format!("Failed to bind {address}"),
                e,
            )
        })?;
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "TCP server listening");

        Ok(Self {
            listener,
            local_addr,
            registry,
            pool: Arc::new(ConnectionPool::new()),
            connections: TaskTracker::new(),
            shutdown,
            max_frame_bytes: config.max_frame_bytes,
            shutdown_grace: Duration::from_secs(config.shutdown_grace_seconds),
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Live connections.
    pub fn pool(&self) -> Arc<ConnectionPool> {
        Arc::clone(&self.pool)
    }

    /// Accept clients until the shutdown token is cancelled, then wait up to
    /// the grace period for open connections to close.
    pub async fn run(self) -> AppResult<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("TCP server stopping");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
                        }
                        let connection = ClientConnection::new(
                            peer,
                            Arc::clone(&self.registry),
                            Arc::clone(&self.pool),
                        );
                        self.connections.spawn(connection.run(
                            stream,
                            self.max_frame_bytes,
                            self.shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }

        drop(self.listener);
        self.connections.close();
        if tokio::time::timeout(self.shutdown_grace, self.connections.wait())
            .await
            .is_err()
        {
            warn!(
                open = self.pool.connection_count(),
                "Connections still open after shutdown grace period"
            );
        }
        info!("TCP server stopped");
        Ok(())
    }
}
