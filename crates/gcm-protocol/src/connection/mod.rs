//! Client connections: the per-connection loop, session binding, and the
//! pool of live connections.

pub mod handle;
pub mod pool;
pub mod session;

pub use handle::ClientConnection;
pub use pool::{ConnectionInfo, ConnectionPool};
pub use session::SessionChange;
