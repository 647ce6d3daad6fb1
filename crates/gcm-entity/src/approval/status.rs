//! Request status and decision enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use gcm_core::types::UserId;

/// Lifecycle status of a pending change record.
///
/// A record leaves `Open` at most once and is never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for a decision.
    Open,
    /// Approved and applied.
    Approved,
    /// Denied.
    Denied,
    /// Resolved; the decision is recorded separately.
    Closed,
}

impl RequestStatus {
    /// Check if the record has been resolved.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Approved => "approved",
            Self::Denied => "denied",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An approver's verdict on a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "decision", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Apply the proposal.
    Approve,
    /// Reject the proposal.
    Deny,
}

impl Decision {
    /// Return the decision as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal stamp written onto a record when it leaves `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The verdict.
    pub decision: Decision,
    /// Status persisted for the verdict.
    pub status: RequestStatus,
    /// Who decided.
    pub processed_by: UserId,
    /// When the decision was made.
    pub processed_at: DateTime<Utc>,
}
