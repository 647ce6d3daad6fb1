//! Server wiring: stores, services, and the handler registry.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use gcm_auth::LoginService;
use gcm_core::AppResult;
use gcm_core::config::AppConfig;
use gcm_database::{CatalogStore, UserStore};
use gcm_service::{ContentApprovalService, PriceApprovalService};

use crate::handlers::build_registry;
use crate::registry::HandlerRegistry;
use crate::server::TcpServer;

/// The services handlers call into.
#[derive(Debug, Clone)]
pub struct Services {
    /// Login and account lockout.
    pub login: LoginService,
    /// Map price workflow.
    pub prices: PriceApprovalService,
    /// Catalog content workflow.
    pub content: ContentApprovalService,
}

impl Services {
    /// Build every service over the given stores.
    pub fn new(
        config: &AppConfig,
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> AppResult<Self> {
        Ok(Self {
            login: LoginService::new(users, &config.auth)?,
            prices: PriceApprovalService::new(Arc::clone(&catalog)),
            content: ContentApprovalService::new(catalog),
        })
    }
}

/// Everything a running server owns.
///
/// Built once at startup and passed down explicitly; there is no global
/// state.
#[derive(Debug, Clone)]
pub struct ServerContext {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Shared services.
    pub services: Arc<Services>,
    /// Action routing.
    pub registry: Arc<HandlerRegistry>,
    shutdown: CancellationToken,
}

impl ServerContext {
    /// Wire services and handlers over the given stores.
    pub fn build(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> AppResult<Self> {
        let services = Arc::new(Services::new(&config, users, catalog)?);
        let timeout = Duration::from_secs(config.server.request_timeout_seconds);
        let registry = Arc::new(build_registry(Arc::clone(&services), timeout));
        info!(actions = registry.len(), "Handler registry built");

        Ok(Self {
            config: Arc::new(config),
            services,
            registry,
            shutdown: CancellationToken::new(),
        })
    }

    /// Reschedule unblock timers for accounts blocked before a restart.
    pub async fn resume_background_tasks(&self) -> AppResult<usize> {
        self.services.login.resume_pending_unblocks().await
    }

    /// Bind the TCP listener configured in `[server]`.
    pub async fn bind(&self) -> AppResult<TcpServer> {
        TcpServer::bind(
            &self.config.server,
            Arc::clone(&self.registry),
            self.shutdown.child_token(),
        )
        .await
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop accepting work and drain background tasks.
    pub async fn shutdown(&self) {
        info!("Shutting down server context");
        self.shutdown.cancel();
        let grace = Duration::from_secs(self.config.server.shutdown_grace_seconds);
        self.services.login.shutdown(grace).await;
    }
}
