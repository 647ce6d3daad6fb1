//! Per-account lockout counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable lockout state attached to a user account.
///
/// `failed_attempts` returns to zero on a successful login or an unblock,
/// and `blocked` is only ever set once the attempt threshold is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityState {
    /// Consecutive failed login attempts.
    pub failed_attempts: u32,
    /// Whether logins are currently refused.
    pub blocked: bool,
    /// When the block started.
    pub blocked_at: Option<DateTime<Utc>>,
}

impl SecurityState {
    /// The state of an account with no failures on record.
    pub fn cleared() -> Self {
        Self::default()
    }

    /// The state right after the threshold was reached.
    pub fn blocked(failed_attempts: u32, at: DateTime<Utc>) -> Self {
        Self {
            failed_attempts,
            blocked: true,
            blocked_at: Some(at),
        }
    }
}
