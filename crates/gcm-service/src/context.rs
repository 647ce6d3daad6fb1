//! Request context carrying the connection and its authenticated session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gcm_core::types::{ConnectionId, SessionId};
use gcm_core::{AppError, AppResult};
use gcm_entity::user::{UserRole, UserSummary};

/// The user bound to a connection by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Session issued at login.
    pub session_id: SessionId,
    /// Who logged in.
    pub user: UserSummary,
}

/// Context for one request on one connection.
///
/// Built by the connection loop and passed to every handler so that each
/// operation knows *who* is acting and from *which* connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Connection the request arrived on.
    pub connection_id: ConnectionId,
    /// Remote address of the peer.
    pub peer_addr: String,
    /// Session bound to the connection, if any.
    pub session: Option<SessionUser>,
    /// When the request was received.
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for a request on `connection_id`.
    pub fn new(
        connection_id: ConnectionId,
        peer_addr: impl Into<String>,
        session: Option<SessionUser>,
    ) -> Self {
        Self {
            connection_id,
            peer_addr: peer_addr.into(),
            session,
            received_at: Utc::now(),
        }
    }

    /// The authenticated user, or an authentication error.
    pub fn require_user(&self) -> AppResult<&UserSummary> {
        self.session
            .as_ref()
            .map(|s| &s.user)
            .ok_or_else(|| AppError::authentication("Login required"))
    }

    /// The authenticated user if their role is at least `minimum`.
    pub fn require_role(&self, minimum: UserRole) -> AppResult<&UserSummary> {
        let user = self.require_user()?;
        if !user.role.has_at_least(&minimum) {
            return Err(AppError::authorization(format!(
                "Requires role {minimum} or higher"
            )));
        }
        Ok(user)
    }
}
