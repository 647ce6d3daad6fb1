//! Pending content change records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use gcm_core::types::{ContentRequestId, UserId};

use super::content_details::ContentDetails;
use super::status::{RequestStatus, Resolution};

/// What a content change does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_action", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentAction {
    /// Create a new entity.
    Add,
    /// Overwrite fields of an existing entity.
    Edit,
    /// Remove an existing entity.
    Delete,
}

impl ContentAction {
    /// Return the action as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Edit => "EDIT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the action operates on an existing entity.
    pub fn needs_target(&self) -> bool {
        !matches!(self, Self::Add)
    }
}

impl fmt::Display for ContentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which kind of catalog entity a content change targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    /// A city map.
    Map,
    /// A point of interest.
    Site,
    /// A tour.
    Tour,
    /// A city.
    City,
}

impl ContentType {
    /// Return the content type as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Map => "MAP",
            Self::Site => "SITE",
            Self::Tour => "TOUR",
            Self::City => "CITY",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed catalog edit awaiting a content manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContentRequest {
    /// Record ID.
    pub id: ContentRequestId,
    /// Who proposed the change.
    pub requested_by: Option<UserId>,
    /// Add, edit, or delete.
    pub action_type: ContentAction,
    /// Targeted entity kind.
    pub content_type: ContentType,
    /// Targeted entity for edits and deletes.
    pub target_id: Option<Uuid>,
    /// Name shown to approvers.
    pub target_name: String,
    /// Versioned JSON document holding the typed details.
    pub content_details: String,
    /// Current status.
    pub status: RequestStatus,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Decision time.
    pub processed_at: Option<DateTime<Utc>>,
    /// Who decided.
    pub processed_by: Option<UserId>,
}

impl ContentRequest {
    /// Stamp the record with its terminal state.
    pub fn resolve(&mut self, resolution: &Resolution) {
        self.status = resolution.status;
        self.processed_at = Some(resolution.processed_at);
        self.processed_by = Some(resolution.processed_by);
    }
}

/// An open content request with decoded details for approvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRequestView {
    /// Record ID.
    pub id: ContentRequestId,
    /// Add, edit, or delete.
    pub action_type: ContentAction,
    /// Targeted entity kind.
    pub content_type: ContentType,
    /// Targeted entity.
    pub target_id: Option<Uuid>,
    /// Name shown to approvers.
    pub target_name: String,
    /// Who proposed the change.
    pub requested_by: Option<UserId>,
    /// Requester display name.
    pub requester_name: Option<String>,
    /// Proposed values.
    pub details: ContentDetails,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}
