//! Pure lockout transition rules.

use std::time::Duration;

use chrono::{DateTime, Utc};

use gcm_core::config::AuthConfig;
use gcm_entity::user::SecurityState;

/// How a password check changed the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Correct password.
    Granted,
    /// Wrong password, account still active.
    Rejected {
        /// Attempts left before the account is blocked.
        remaining_attempts: u32,
    },
    /// Wrong password that reached the threshold.
    Locked,
}

/// New security state plus what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State to persist.
    pub next: SecurityState,
    /// Outcome to report.
    pub outcome: AttemptOutcome,
}

/// Threshold and duration of the lockout.
///
/// A blocked account never reaches this policy; callers refuse it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that block an account.
    pub max_failed_attempts: u32,
    /// How long a block lasts.
    pub lockout_duration: Duration,
}

impl LockoutPolicy {
    /// Build the policy from the `[auth]` section.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts.max(1),
            lockout_duration: config.lockout_duration(),
        }
    }

    /// Correct password: the counter starts over.
    pub fn on_success(&self, _current: &SecurityState) -> Transition {
        Transition {
            next: SecurityState::cleared(),
            outcome: AttemptOutcome::Granted,
        }
    }

    /// Wrong password at `now`.
    pub fn on_failure(&self, current: &SecurityState, now: DateTime<Utc>) -> Transition {
        let failed = current.failed_attempts.saturating_add(1);
        if failed >= self.max_failed_attempts {
            Transition {
                next: SecurityState::blocked(failed, now),
                outcome: AttemptOutcome::Locked,
            }
        } else {
            Transition {
                next: SecurityState {
                    failed_attempts: failed,
                    blocked: false,
                    blocked_at: None,
                },
                outcome: AttemptOutcome::Rejected {
                    remaining_attempts: self.max_failed_attempts - failed,
                },
            }
        }
    }

    /// Time left on a block that started at `blocked_at`.
    pub fn remaining_lockout(&self, blocked_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        let elapsed = (now - blocked_at).to_std().unwrap_or(Duration::ZERO);
        self.lockout_duration.saturating_sub(elapsed)
    }
}
