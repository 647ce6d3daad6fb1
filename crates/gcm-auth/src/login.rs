//! Login with account lockout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, warn};

use gcm_core::config::AuthConfig;
use gcm_core::types::{SessionId, UserId};
use gcm_core::{AppError, AppResult};
use gcm_database::UserStore;
use gcm_entity::user::{SecurityState, UserSummary};

use crate::lockout::{AttemptOutcome, LockoutPolicy, UnblockScheduler, UserLocks};
use crate::password::PasswordHasher;

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials accepted.
    Success {
        /// The authenticated user.
        user: UserSummary,
        /// Fresh session for the connection.
        session_id: SessionId,
    },
    /// No account with that username.
    UnknownUser,
    /// Wrong password, account still active.
    InvalidPassword {
        /// Attempts left before the account is blocked.
        remaining_attempts: u32,
    },
    /// This attempt blocked the account.
    Locked {
        /// How long the block lasts.
        lockout: Duration,
    },
    /// The account was already blocked.
    Blocked,
}

impl LoginOutcome {
    /// Whether the user is now authenticated.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { .. } => write!(f, "Login successful"),
            Self::UnknownUser => write!(f, "User not found"),
            Self::InvalidPassword { remaining_attempts } => write!(
                f,
                "Invalid password. {remaining_attempts} attempt(s) remaining before the account is blocked"
            ),
            Self::Locked { lockout } => write!(
                f,
                "Too many failed attempts. Account blocked for {} seconds",
                lockout.as_secs()
            ),
            Self::Blocked => write!(f, "Account is blocked. Please try again later"),
        }
    }
}

/// Drives the lockout state machine for every login.
///
/// Clones share the per-user locks and the unblock scheduler.
#[derive(Debug, Clone)]
pub struct LoginService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    policy: LockoutPolicy,
    locks: Arc<UserLocks>,
    scheduler: UnblockScheduler,
}

impl LoginService {
    /// Creates a login service from the `[auth]` section.
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig) -> AppResult<Self> {
        Ok(Self {
            users,
            hasher: PasswordHasher::from_config(config)?,
            policy: LockoutPolicy::from_config(config),
            locks: Arc::new(UserLocks::new()),
            scheduler: UnblockScheduler::new(),
        })
    }

    /// The hasher new passwords must be hashed with.
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// The active lockout policy.
    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Unblock tasks not yet finished.
    pub fn pending_unblocks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Check credentials and update the account's security state.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let Some(found) = self.users.find_by_username(username).await? else {
            info!(username = %username, "Login for unknown user");
            return Ok(LoginOutcome::UnknownUser);
        };

        let _guard = self.locks.lock(found.id).await;

        // Reload under the lock; the row may have changed while waiting.
        let user = self
            .users
            .find_by_id(found.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", found.id)))?;
        let current = user.security_state();

        if current.blocked {
            info!(user_id = %user.id, "Login refused for blocked account");
            return Ok(LoginOutcome::Blocked);
        }

        if self.hasher.verify_password(password, &user.password_hash)? {
            let transition = self.policy.on_success(&current);
            if transition.next != current {
                self.users
                    .save_security_state(user.id, &transition.next)
                    .await?;
            }
            let now = Utc::now();
            self.users.record_login(user.id, now).await?;

            info!(user_id = %user.id, role = %user.role, "Login successful");
            return Ok(LoginOutcome::Success {
                user: user.summary(),
                session_id: SessionId::new(),
            });
        }

        // Timestamps are stored with microsecond precision.
        let now = Utc::now().trunc_subsecs(6);
        let transition = self.policy.on_failure(&current, now);
        self.users
            .save_security_state(user.id, &transition.next)
            .await?;

        match transition.outcome {
            AttemptOutcome::Locked => {
                warn!(
                    user_id = %user.id,
                    failed_attempts = transition.next.failed_attempts,
                    lockout_seconds = self.policy.lockout_duration.as_secs(),
                    "Account blocked after repeated failures"
                );
                self.schedule_unblock(user.id, Some(now), self.policy.lockout_duration);
                Ok(LoginOutcome::Locked {
                    lockout: self.policy.lockout_duration,
                })
            }
            AttemptOutcome::Rejected { remaining_attempts } => {
                info!(
                    user_id = %user.id,
                    failed_attempts = transition.next.failed_attempts,
                    "Invalid password"
                );
                Ok(LoginOutcome::InvalidPassword { remaining_attempts })
            }
            AttemptOutcome::Granted => Err(AppError::internal(
                "Lockout policy granted a failed password check",
            )),
        }
    }

    /// Clear a user's lockout immediately.
    ///
    /// Returns whether the account was blocked. A pending timer for the same
    /// block still fires and finds the account active.
    pub async fn unblock(&self, username: &str) -> AppResult<bool> {
        let found = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))?;

        let _guard = self.locks.lock(found.id).await;
        let current = self
            .users
            .find_by_id(found.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))?
            .security_state();

        if current != SecurityState::cleared() {
            self.users
                .save_security_state(found.id, &SecurityState::cleared())
                .await?;
        }
        info!(user_id = %found.id, was_blocked = current.blocked, "Account unblocked manually");
        Ok(current.blocked)
    }

    /// Reschedule unblocks for accounts that were blocked before a restart.
    ///
    /// Returns the number of timers scheduled.
    pub async fn resume_pending_unblocks(&self) -> AppResult<usize> {
        let blocked = self.users.find_blocked().await?;
        let now = Utc::now();

        for user in &blocked {
            let delay = user
                .blocked_at
                .map(|at| self.policy.remaining_lockout(at, now))
                .unwrap_or(Duration::ZERO);
            debug!(user_id = %user.id, delay_ms = delay.as_millis() as u64, "Resuming unblock timer");
            self.schedule_unblock(user.id, user.blocked_at, delay);
        }

        if !blocked.is_empty() {
            info!(count = blocked.len(), "Resumed pending unblock timers");
        }
        Ok(blocked.len())
    }

    /// Cancel pending timers and wait for running ones.
    pub async fn shutdown(&self, grace: Duration) {
        self.scheduler.shutdown(grace).await;
    }

    fn schedule_unblock(&self, user_id: UserId, blocked_at: Option<DateTime<Utc>>, delay: Duration) {
        UnblockJob {
            users: Arc::clone(&self.users),
            locks: Arc::clone(&self.locks),
            scheduler: self.scheduler.clone(),
            user_id,
            blocked_at,
        }
        .schedule(delay, 0);
    }
}

/// First retry delay after a failed unblock.
const RETRY_BASE: Duration = Duration::from_secs(1);
/// Upper bound for the retry delay.
const RETRY_MAX: Duration = Duration::from_secs(60);

/// One pending unblock, rescheduled until the store accepts it.
struct UnblockJob {
    users: Arc<dyn UserStore>,
    locks: Arc<UserLocks>,
    scheduler: UnblockScheduler,
    user_id: UserId,
    blocked_at: Option<DateTime<Utc>>,
}

impl UnblockJob {
    fn schedule(self, delay: Duration, attempt: u32) {
        let scheduler = self.scheduler.clone();
        scheduler.schedule(delay, async move {
            let result =
                unblock_expired(self.users.as_ref(), &self.locks, self.user_id, self.blocked_at)
                    .await;
            if let Err(e) = result {
                let retry_in = retry_delay(attempt);
                warn!(
                    user_id = %self.user_id,
                    attempt = attempt + 1,
                    retry_in_secs = retry_in.as_secs(),
                    error = %e,
                    "Scheduled unblock failed, retrying"
                );
                self.schedule(retry_in, attempt + 1);
            }
        });
    }
}

/// Exponential backoff capped at [`RETRY_MAX`].
fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE
        .saturating_mul(1u32 << attempt.min(16))
        .min(RETRY_MAX)
}

/// Clear the block that started at `blocked_at`, if it is still in place.
///
/// A newer block carries its own timer and is left alone.
async fn unblock_expired(
    users: &dyn UserStore,
    locks: &UserLocks,
    user_id: UserId,
    blocked_at: Option<DateTime<Utc>>,
) -> AppResult<()> {
    let _guard = locks.lock(user_id).await;
    let Some(user) = users.find_by_id(user_id).await? else {
        debug!(user_id = %user_id, "Blocked user no longer exists");
        return Ok(());
    };

    let current = user.security_state();
    if !current.blocked {
        debug!(user_id = %user_id, "Account already active");
        return Ok(());
    }
    if current.blocked_at != blocked_at {
        debug!(user_id = %user_id, "Account re-blocked since this timer started");
        return Ok(());
    }

    users
        .save_security_state(user_id, &SecurityState::cleared())
        .await?;
    info!(user_id = %user_id, "Lockout expired, account unblocked");
    Ok(())
}
