//! Shared test helpers for integration tests.
//!
//! `TestApp` runs the real registry and services over the in-memory stores.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::task::JoinHandle;

use gcm_auth::PasswordHasher;
use gcm_core::AppResult;
use gcm_core::config::AppConfig;
use gcm_core::types::{CityId, ConnectionId, MapId, SessionId};
use gcm_database::{CatalogStore, CatalogTransaction, UserStore};
use gcm_database::memory::{MemoryCatalogStore, MemoryUserStore};
use gcm_entity::catalog::{City, Map};
use gcm_entity::user::{NewUser, UserRole, UserSummary};
use gcm_protocol::message::{Action, Message, Payload, RecordRef};
use gcm_protocol::{GcmClient, ServerContext, TcpServer};
use gcm_service::{RequestContext, SessionUser};

/// Password every helper-created account uses.
pub const PASSWORD: &str = "correct horse battery";

/// Test application context
pub struct TestApp {
    /// Account store behind the services.
    pub users: MemoryUserStore,
    /// Catalog store behind the services.
    pub catalog: MemoryCatalogStore,
    /// Wired services and registry.
    pub context: ServerContext,
    /// Configuration the app was built with.
    pub config: AppConfig,
}

/// Configuration with cheap hashing and a loopback ephemeral port.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.server.request_timeout_seconds = 5;
    config.server.shutdown_grace_seconds = 2;
    config.auth.password_hash_memory_kib = 8;
    config.auth.password_hash_iterations = 1;
    config
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test application over fresh stores.
    pub async fn with_config(config: AppConfig) -> Self {
        let users = MemoryUserStore::new();
        let catalog = MemoryCatalogStore::new().with_user_directory(users.clone());
        Self::with_stores(config, users, catalog)
    }

    /// Create a test application over existing stores (simulates a restart).
    pub fn with_stores(config: AppConfig, users: MemoryUserStore, catalog: MemoryCatalogStore) -> Self {
        let context = ServerContext::build(
            config.clone(),
            Arc::new(users.clone()),
            Arc::new(catalog.clone()),
        )
        .expect("Failed to build server context");
        Self {
            users,
            catalog,
            context,
            config,
        }
    }

    /// Create an account with [`PASSWORD`].
    pub async fn create_user(&self, username: &str, role: UserRole) -> UserSummary {
        let hasher = PasswordHasher::from_config(&self.config.auth).expect("hasher");
        self.users
            .create(&NewUser {
                username: username.to_string(),
                display_name: username.split('@').next().unwrap_or(username).to_string(),
                email: Some(username.to_string()),
                password_hash: hasher.hash_password(PASSWORD).expect("hash"),
                role,
            })
            .await
            .expect("Failed to create test user")
            .summary()
    }

    /// A request context for a connection already logged in as `user`.
    pub fn context_for(&self, user: &UserSummary) -> RequestContext {
        RequestContext::new(
            ConnectionId::new(),
            "127.0.0.1:50000",
            Some(SessionUser {
                session_id: SessionId::new(),
                user: user.clone(),
            }),
        )
    }

    /// A request context for a connection nobody has logged in on.
    pub fn anonymous(&self) -> RequestContext {
        RequestContext::new(ConnectionId::new(), "127.0.0.1:50001", None)
    }

    /// Route a message through the registry.
    pub async fn dispatch(&self, ctx: RequestContext, message: Message) -> Message {
        self.context.registry.dispatch(ctx, message).await
    }

    /// Dispatch a request whose body is a record reference.
    pub async fn decide(
        &self,
        ctx: RequestContext,
        action: Action,
        record_id: impl Into<uuid::Uuid>,
    ) -> Message {
        self.dispatch(
            ctx,
            Message::new(
                action,
                Payload::RecordRef(RecordRef {
                    record_id: record_id.into(),
                }),
            ),
        )
        .await
    }

    /// Insert a city directly into the catalog.
    pub async fn seed_city(&self, name: &str) -> City {
        let city = City {
            id: CityId::new(),
            name: name.to_string(),
            description: format!("{name} city guide"),
        };
        let mut tx = self.catalog_tx().await;
        tx.insert_city(&city).await.expect("insert city");
        tx.commit().await.expect("commit");
        city
    }

    /// Insert a map directly into the catalog.
    pub async fn seed_map(&self, city: &City, name: &str, price: Decimal) -> Map {
        let map = Map {
            id: MapId::new(),
            city_id: city.id,
            name: name.to_string(),
            description: String::new(),
            price,
        };
        let mut tx = self.catalog_tx().await;
        tx.insert_map(&map).await.expect("insert map");
        tx.commit().await.expect("commit");
        map
    }

    /// Current stored price of a map.
    pub async fn map_price(&self, id: MapId) -> Decimal {
        self.catalog
            .find_map(id)
            .await
            .expect("find map")
            .expect("map exists")
            .price
    }

    async fn catalog_tx(&self) -> Box<dyn CatalogTransaction> {
        self.catalog.begin().await.expect("begin")
    }

    /// Bind a TCP server on an ephemeral port and run it in the background.
    pub async fn spawn_server(&self) -> (SocketAddr, JoinHandle<AppResult<()>>) {
        let server: TcpServer = self.context.bind().await.expect("Failed to bind");
        let addr = server.local_addr();
        (addr, tokio::spawn(server.run()))
    }

    /// Connect a client to a running server.
    pub async fn client(&self, addr: SocketAddr) -> GcmClient {
        GcmClient::connect(addr, self.config.server.max_frame_bytes)
            .await
            .expect("Failed to connect")
    }
}

/// The outcome of a response, panicking on anything else.
pub fn outcome(message: &Message) -> &gcm_protocol::message::Outcome {
    message
        .as_outcome()
        .unwrap_or_else(|| panic!("expected an outcome, got {message:?}"))
}
