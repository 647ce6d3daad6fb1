//! Price change workflow handlers.

use std::sync::Arc;

use gcm_core::AppResult;
use gcm_core::types::PriceUpdateId;
use gcm_entity::user::UserRole;
use gcm_service::RequestContext;

use super::{failed, payload};
use crate::context::Services;
use crate::message::{Action, Message, Outcome, Payload, PendingList};

/// `SUBMIT_PRICE_CHANGE`
pub async fn submit(
    services: Arc<Services>,
    ctx: RequestContext,
    message: Message,
) -> AppResult<Message> {
    let requester = ctx.require_role(UserRole::ContentManager)?.id;
    let request = payload!(message, PriceChange);

    let response = match services
        .prices
        .submit(request.map_id, Some(requester), request.new_price)
        .await
    {
        Ok(record) => Message::outcome(
            Action::SubmitPriceChangeResponse,
            Outcome::ok("Price change submitted for approval").with_record(record.id),
        ),
        Err(e) => failed(Action::SubmitPriceChange, e),
    };
    Ok(response)
}

/// `GET_PENDING_APPROVALS`
pub async fn list_pending(
    services: Arc<Services>,
    ctx: RequestContext,
    _message: Message,
) -> AppResult<Message> {
    ctx.require_role(UserRole::CompanyManager)?;
    let records = services.prices.list_pending().await?;
    Ok(Message::new(
        Action::PendingApprovals,
        Payload::PendingPrices(PendingList::new(records)),
    ))
}

/// `APPROVE_PENDING`
pub async fn approve(
    services: Arc<Services>,
    ctx: RequestContext,
    message: Message,
) -> AppResult<Message> {
    let approver = ctx.require_role(UserRole::CompanyManager)?.id;
    let id = PriceUpdateId::from_uuid(payload!(message, RecordRef).record_id);

    let response = match services.prices.approve(id, approver).await {
        Ok(record) => Message::outcome(
            Action::ApprovePendingResponse,
            Outcome::ok(format!("Price set to {}", record.new_price)).with_record(record.id),
        ),
        Err(e) => failed(Action::ApprovePending, e),
    };
    Ok(response)
}

/// `DENY_PENDING`
pub async fn deny(
    services: Arc<Services>,
    ctx: RequestContext,
    message: Message,
) -> AppResult<Message> {
    let denier = ctx.require_role(UserRole::CompanyManager)?.id;
    let id = PriceUpdateId::from_uuid(payload!(message, RecordRef).record_id);

    let response = match services.prices.deny(id, denier).await {
        Ok(record) => Message::outcome(
            Action::DenyPendingResponse,
            Outcome::ok("Price change denied").with_record(record.id),
        ),
        Err(e) => failed(Action::DenyPending, e),
    };
    Ok(response)
}
