//! Connection pool: tracks all live connections and who is logged in on them.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use gcm_core::types::{ConnectionId, UserId};
use gcm_entity::user::UserSummary;

/// What the server knows about one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub peer_addr: String,
    pub connected_at: DateTime<Utc>,
    /// The logged-in user, if any.
    pub user: Option<UserSummary>,
}

/// Thread-safe registry of live connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    by_id: DashMap<ConnectionId, ConnectionInfo>,
}

impl ConnectionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly accepted connection.
    pub fn add(&self, id: ConnectionId, peer_addr: impl Into<String>) {
        self.by_id.insert(
            id,
            ConnectionInfo {
                id,
                peer_addr: peer_addr.into(),
                connected_at: Utc::now(),
                user: None,
            },
        );
    }

    /// Record who is logged in on a connection (`None` after logout).
    pub fn set_user(&self, id: &ConnectionId, user: Option<UserSummary>) {
        if let Some(mut entry) = self.by_id.get_mut(id) {
            entry.user = user;
        }
    }

    /// Stop tracking a connection.
    pub fn remove(&self, id: &ConnectionId) -> Option<ConnectionInfo> {
        self.by_id.remove(id).map(|(_, info)| info)
    }

    /// Snapshot of one connection.
    pub fn get(&self, id: &ConnectionId) -> Option<ConnectionInfo> {
        self.by_id.get(id).map(|entry| entry.value().clone())
    }

    /// Connections on which `user_id` is logged in.
    pub fn user_connections(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.by_id
            .iter()
            .filter(|entry| entry.user.as_ref().is_some_and(|u| u.id == *user_id))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Number of live connections with a logged-in user.
    pub fn authenticated_count(&self) -> usize {
        self.by_id.iter().filter(|entry| entry.user.is_some()).count()
    }
}
