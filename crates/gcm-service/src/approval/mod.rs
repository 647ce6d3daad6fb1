//! Approval workflows.
//!
//! Price and content changes share one protocol: submit an open record,
//! list open records, then approve or deny each record exactly once inside
//! a single transaction.

pub mod apply;
pub mod content;
pub mod error;
pub mod price;

pub use content::{ContentApprovalService, ContentSubmission};
pub use error::{ApprovalError, ApprovalResult};
pub use price::PriceApprovalService;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::warn;

use gcm_database::CatalogTransaction;

/// Commit on success, roll back on failure.
async fn finish<T>(
    tx: Box<dyn CatalogTransaction>,
    result: ApprovalResult<T>,
) -> ApprovalResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// Current time at the precision the database stores.
fn stamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
