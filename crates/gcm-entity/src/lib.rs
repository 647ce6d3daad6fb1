//! # gcm-entity
//!
//! Domain entity models for the GCM server. Every struct in this crate
//! represents a database table row or a domain value object. Row types
//! additionally derive `sqlx::FromRow`.

pub mod approval;
pub mod catalog;
pub mod user;
