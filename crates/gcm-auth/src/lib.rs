//! # gcm-auth
//!
//! Credential checking and the account lockout state machine.
//!
//! ## Modules
//!
//! - `password` — Argon2id password hashing and verification
//! - `lockout` — lockout policy, per-user locks, and delayed unblocks
//! - `login` — the login and manual unblock entry points

pub mod lockout;
pub mod login;
pub mod password;

pub use lockout::{LockoutPolicy, UnblockScheduler, UserLocks};
pub use login::{LoginOutcome, LoginService};
pub use password::PasswordHasher;
