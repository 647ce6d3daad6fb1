//! Account lockout: the transition rules, the per-user serialisation, and
//! the delayed unblock tasks.

pub mod guard;
pub mod policy;
pub mod scheduler;

pub use guard::{UserGuard, UserLocks};
pub use policy::{AttemptOutcome, LockoutPolicy, Transition};
pub use scheduler::UnblockScheduler;
