//! Catalog content change workflow.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use gcm_core::types::{ContentRequestId, UserId};
use gcm_database::{CatalogStore, CatalogTransaction};
use gcm_entity::approval::{
    ContentAction, ContentDetails, ContentDetailsDocument, ContentRequest, ContentRequestView,
    ContentType, Decision, RequestStatus, Resolution,
};

use super::apply::apply_content;
use super::error::{ApprovalError, ApprovalResult};
use super::{finish, stamp};

/// Content records end as approved or denied.
fn terminal_status(decision: Decision) -> RequestStatus {
    match decision {
        Decision::Approve => RequestStatus::Approved,
        Decision::Deny => RequestStatus::Denied,
    }
}

/// A proposed catalog edit as submitted by an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSubmission {
    /// Add, edit, or delete.
    pub action_type: ContentAction,
    /// Targeted entity kind.
    pub content_type: ContentType,
    /// Targeted entity, required for edits and deletes.
    #[serde(default)]
    pub target_id: Option<Uuid>,
    /// Name shown to approvers.
    pub target_name: String,
    /// Proposed values.
    pub details: ContentDetails,
}

impl ContentSubmission {
    fn validate(&self) -> ApprovalResult<()> {
        if self.details.action_type() != self.action_type
            || self.details.content_type() != self.content_type
        {
            return Err(ApprovalError::Validation(format!(
                "Details describe {} {} but the request is {} {}",
                self.details.action_type(),
                self.details.content_type(),
                self.action_type,
                self.content_type
            )));
        }
        if self.action_type.needs_target() && self.target_id.is_none() {
            return Err(ApprovalError::Validation(format!(
                "{} requires a target id",
                self.action_type
            )));
        }
        if self.target_name.trim().is_empty() {
            return Err(ApprovalError::Validation(
                "Target name cannot be empty".into(),
            ));
        }
        self.details.validate()?;
        Ok(())
    }
}

/// Proposes and decides catalog content changes.
#[derive(Debug, Clone)]
pub struct ContentApprovalService {
    catalog: Arc<dyn CatalogStore>,
}

impl ContentApprovalService {
    /// Creates a new content approval service.
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Record a proposed catalog edit.
    pub async fn submit(
        &self,
        submission: ContentSubmission,
        requested_by: Option<UserId>,
    ) -> ApprovalResult<ContentRequest> {
        submission.validate()?;

        let record = ContentRequest {
            id: ContentRequestId::new(),
            requested_by,
            action_type: submission.action_type,
            content_type: submission.content_type,
            target_id: if submission.action_type.needs_target() {
                submission.target_id
            } else {
                None
            },
            target_name: submission.target_name.trim().to_string(),
            content_details: ContentDetailsDocument::encode(&submission.details)?,
            status: RequestStatus::Open,
            created_at: Utc::now(),
            processed_at: None,
            processed_by: None,
        };

        let mut tx = self.catalog.begin().await?;
        let result = tx
            .insert_content_request(&record)
            .await
            .map_err(ApprovalError::from);
        finish(tx, result).await?;

        info!(
            record_id = %record.id,
            action = %record.action_type,
            content_type = %record.content_type,
            target = %record.target_name,
            "Content change submitted"
        );
        Ok(record)
    }

    /// Open requests, newest first.
    pub async fn list_pending(&self) -> ApprovalResult<Vec<ContentRequestView>> {
        Ok(self.catalog.open_content_requests().await?)
    }

    /// Apply the change and mark the request approved.
    ///
    /// For an ADD the returned record carries the created entity's id.
    pub async fn approve(
        &self,
        id: ContentRequestId,
        approver: UserId,
    ) -> ApprovalResult<ContentRequest> {
        self.decide(id, Decision::Approve, approver).await
    }

    /// Mark the request denied without touching the catalog.
    pub async fn deny(&self, id: ContentRequestId, denier: UserId) -> ApprovalResult<ContentRequest> {
        self.decide(id, Decision::Deny, denier).await
    }

    async fn decide(
        &self,
        id: ContentRequestId,
        decision: Decision,
        actor: UserId,
    ) -> ApprovalResult<ContentRequest> {
        let mut tx = self.catalog.begin().await?;
        let result = Self::decide_in(tx.as_mut(), id, decision, actor).await;
        let record = finish(tx, result).await?;

        info!(
            record_id = %id,
            action = %record.action_type,
            content_type = %record.content_type,
            status = %record.status,
            processed_by = %actor,
            "Content change resolved"
        );
        Ok(record)
    }

    async fn decide_in(
        tx: &mut dyn CatalogTransaction,
        id: ContentRequestId,
        decision: Decision,
        actor: UserId,
    ) -> ApprovalResult<ContentRequest> {
        let mut record = tx
            .lock_content_request(id)
            .await?
            .ok_or_else(|| ApprovalError::NotFound(id.to_string()))?;

        if record.status.is_terminal() {
            return Err(ApprovalError::AlreadyResolved {
                id: id.to_string(),
                status: record.status,
            });
        }

        // ADD records have no target until the entity exists.
        let applied = match decision {
            Decision::Approve => Some(apply_content(tx, &record).await?),
            Decision::Deny => None,
        };

        let resolution = Resolution {
            decision,
            status: terminal_status(decision),
            processed_by: actor,
            processed_at: stamp(),
        };
        if !tx.resolve_content_request(id, &resolution, applied).await? {
            return Err(ApprovalError::AlreadyResolved {
                id: id.to_string(),
                status: record.status,
            });
        }

        record.target_id = record.target_id.or(applied);
        record.resolve(&resolution);
        Ok(record)
    }
}
