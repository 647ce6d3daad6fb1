//! # gcm-database
//!
//! Persistence for the GCM server. The store traits in [`store`] are the
//! only surface the services see; [`repositories`] implements them over
//! PostgreSQL and [`memory`] implements them in process for tests and
//! single-node development.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{CatalogStore, CatalogTransaction, UserStore};
