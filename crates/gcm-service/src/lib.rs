//! # gcm-service
//!
//! Business logic for the GCM server: the price and content approval
//! workflows, plus the per-request context handlers receive.
//!
//! Services follow constructor injection; stores are passed in as
//! `Arc<dyn ...>` trait objects at construction time.

pub mod approval;
pub mod context;

pub use approval::{
    ApprovalError, ApprovalResult, ContentApprovalService, ContentSubmission,
    PriceApprovalService,
};
pub use context::{RequestContext, SessionUser};
