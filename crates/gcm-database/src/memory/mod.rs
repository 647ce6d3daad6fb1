//! In-process store implementations.
//!
//! Used by the test suites and for running a single node without
//! PostgreSQL. State lives behind Tokio locks; nothing is persisted.

pub mod catalog;
pub mod user;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gcm_core::{AppError, AppResult};

pub use catalog::{MemoryCatalogStore, MemoryCatalogTransaction};
pub use user::MemoryUserStore;

/// Switch that makes a memory store fail like an unreachable database.
#[derive(Debug, Clone, Default)]
pub struct Availability {
    down: Arc<AtomicBool>,
}

impl Availability {
    /// Toggle simulated outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.down.store(unavailable, Ordering::SeqCst);
    }

    /// Fail if an outage is being simulated.
    pub fn check(&self) -> AppResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("Store is unavailable"));
        }
        Ok(())
    }
}
