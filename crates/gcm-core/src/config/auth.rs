//! Authentication and account lockout configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Consecutive failed logins that block an account.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: u32,
    /// How long a blocked account stays blocked, in seconds.
    #[serde(default = "default_lockout")]
    pub lockout_duration_seconds: u64,
    /// Argon2 memory cost in KiB for newly hashed passwords.
    #[serde(default = "default_hash_memory")]
    pub password_hash_memory_kib: u32,
    /// Argon2 iteration count for newly hashed passwords.
    #[serde(default = "default_hash_iterations")]
    pub password_hash_iterations: u32,
}

impl AuthConfig {
    /// Lockout duration as a [`Duration`].
    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.lockout_duration_seconds)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed(),
            lockout_duration_seconds: default_lockout(),
            password_hash_memory_kib: default_hash_memory(),
            password_hash_iterations: default_hash_iterations(),
        }
    }
}

fn default_max_failed() -> u32 {
    3
}

fn default_lockout() -> u64 {
    30
}

fn default_hash_memory() -> u32 {
    19 * 1024
}

fn default_hash_iterations() -> u32 {
    2
}
