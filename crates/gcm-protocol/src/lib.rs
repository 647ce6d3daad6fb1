//! # gcm-protocol
//!
//! Request/response protocol for GCM clients. Provides:
//!
//! - The `Message` envelope, action codes, and typed payloads
//! - Length-delimited JSON framing over TCP
//! - The action-keyed handler registry and its handlers
//! - The per-connection loop, the TCP server, and a small client
//! - `ServerContext`, which wires stores, services, and the registry

pub mod client;
pub mod connection;
pub mod context;
pub mod handlers;
pub mod message;
pub mod registry;
pub mod server;

pub use client::GcmClient;
pub use context::{ServerContext, Services};
pub use message::{Action, Message, Payload};
pub use registry::HandlerRegistry;
pub use server::TcpServer;
