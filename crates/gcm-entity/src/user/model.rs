//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gcm_core::types::UserId;

use super::role::UserRole;
use super::security::SecurityState;

/// A registered GCM account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name (usually an email address).
    pub username: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Contact email (optional).
    pub email: Option<String>,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role.
    pub role: UserRole,
    /// Consecutive failed login attempts.
    pub failed_attempts: i32,
    /// Whether the account is currently blocked.
    pub is_blocked: bool,
    /// When the current block started.
    pub blocked_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Snapshot of the lockout counters.
    pub fn security_state(&self) -> SecurityState {
        SecurityState {
            failed_attempts: self.failed_attempts.max(0) as u32,
            blocked: self.is_blocked,
            blocked_at: self.blocked_at,
        }
    }

    /// Copy a security state back onto the row.
    pub fn apply_security_state(&mut self, state: &SecurityState) {
        self.failed_attempts = state.failed_attempts as i32;
        self.is_blocked = state.blocked;
        self.blocked_at = state.blocked_at;
    }

    /// Public view of the account.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Desired username.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
}

/// The identity returned to a client after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Role.
    pub role: UserRole,
}
