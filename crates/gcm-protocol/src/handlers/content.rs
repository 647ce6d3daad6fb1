//! Content change workflow handlers.

use std::sync::Arc;

use gcm_core::AppResult;
use gcm_core::types::ContentRequestId;
use gcm_entity::user::UserRole;
use gcm_service::RequestContext;

use super::{failed, payload};
use crate::context::Services;
use crate::message::{Action, Message, Outcome, Payload, PendingList};

/// `SUBMIT_CONTENT_CHANGE`
pub async fn submit(
    services: Arc<Services>,
    ctx: RequestContext,
    message: Message,
) -> AppResult<Message> {
    let requester = ctx.require_role(UserRole::Employee)?.id;
    let submission = payload!(message, ContentChange);

    let response = match services.content.submit(submission, Some(requester)).await {
        Ok(record) => Message::outcome(
            Action::SubmitContentChangeResponse,
            Outcome::ok(format!(
                "{} {} '{}' submitted for approval",
                record.action_type, record.content_type, record.target_name
            ))
            .with_record(record.id),
        ),
        Err(e) => failed(Action::SubmitContentChange, e),
    };
    Ok(response)
}

/// `GET_PENDING_CONTENT`
pub async fn list_pending(
    services: Arc<Services>,
    ctx: RequestContext,
    _message: Message,
) -> AppResult<Message> {
    ctx.require_role(UserRole::ContentManager)?;
    let records = services.content.list_pending().await?;
    Ok(Message::new(
        Action::PendingContent,
        Payload::PendingContent(PendingList::new(records)),
    ))
}

/// `APPROVE_CONTENT`
pub async fn approve(
    services: Arc<Services>,
    ctx: RequestContext,
    message: Message,
) -> AppResult<Message> {
    let approver = ctx.require_role(UserRole::ContentManager)?.id;
    let id = ContentRequestId::from_uuid(payload!(message, RecordRef).record_id);

    let response = match services.content.approve(id, approver).await {
        Ok(record) => Message::outcome(
            Action::ApproveContentResponse,
            Outcome::ok(format!(
                "{} {} '{}' applied",
                record.action_type, record.content_type, record.target_name
            ))
            .with_record(record.id)
            .with_target(record.target_id),
        ),
        Err(e) => failed(Action::ApproveContent, e),
    };
    Ok(response)
}

/// `DENY_CONTENT`
pub async fn deny(
    services: Arc<Services>,
    ctx: RequestContext,
    message: Message,
) -> AppResult<Message> {
    let denier = ctx.require_role(UserRole::ContentManager)?.id;
    let id = ContentRequestId::from_uuid(payload!(message, RecordRef).record_id);

    let response = match services.content.deny(id, denier).await {
        Ok(record) => Message::outcome(
            Action::DenyContentResponse,
            Outcome::ok("Content change denied").with_record(record.id),
        ),
        Err(e) => failed(Action::DenyContent, e),
    };
    Ok(response)
}
