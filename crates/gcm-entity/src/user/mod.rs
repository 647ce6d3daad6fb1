//! User domain entities.

pub mod model;
pub mod role;
pub mod security;

pub use model::{NewUser, User, UserSummary};
pub use role::UserRole;
pub use security::SecurityState;
