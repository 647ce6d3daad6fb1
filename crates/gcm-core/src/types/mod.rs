//! Core type definitions used across the GCM workspace.

pub mod id;

pub use id::*;
