//! PostgreSQL implementations of the store traits.

pub mod catalog;
pub mod transaction;
pub mod user;

pub use catalog::CatalogRepository;
pub use transaction::PgCatalogTransaction;
pub use user::UserRepository;
