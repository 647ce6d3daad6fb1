//! Request handlers and their registration.
//!
//! Each handler is an `async fn(Arc<Services>, RequestContext, Message)`.
//! Authorization happens here, before a service is called.

pub mod auth;
pub mod content;
pub mod price;

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use gcm_service::ApprovalError;

use crate::context::Services;
use crate::message::{Action, Message, Outcome};
use crate::registry::HandlerRegistry;

/// Take the expected payload variant out of a message or fail with a
/// protocol error.
macro_rules! payload {
    ($message:expr, $variant:ident) => {{
        let action = $message.action;
        match $message.payload {
            $crate::message::Payload::$variant(body) => body,
            other => {
                return Err(gcm_core::AppError::protocol(format!(
                    "{action} expects a {} payload, got {}",
                    stringify!($variant),
                    other.kind()
                )));
            }
        }
    }};
}
pub(crate) use payload;

macro_rules! route {
    ($registry:ident, $services:ident, $action:expr, $handler:path) => {{
        let services = Arc::clone(&$services);
        $registry.register($action, move |ctx, msg| {
            $handler(Arc::clone(&services), ctx, msg)
        });
    }};
}

/// Build the registry with every request action routed.
pub fn build_registry(services: Arc<Services>, timeout: Duration) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new(timeout);

    route!(registry, services, Action::LoginRequest, auth::login);
    route!(registry, services, Action::LogoutRequest, auth::logout);
    route!(registry, services, Action::UnblockUser, auth::unblock_user);
    route!(registry, services, Action::Ping, auth::ping);

    route!(registry, services, Action::SubmitPriceChange, price::submit);
    route!(registry, services, Action::GetPendingApprovals, price::list_pending);
    route!(registry, services, Action::ApprovePending, price::approve);
    route!(registry, services, Action::DenyPending, price::deny);

    route!(registry, services, Action::SubmitContentChange, content::submit);
    route!(registry, services, Action::GetPendingContent, content::list_pending);
    route!(registry, services, Action::ApproveContent, content::approve);
    route!(registry, services, Action::DenyContent, content::deny);

    registry
}

/// Report a workflow failure as an outcome response.
pub(crate) fn failed(action: Action, err: ApprovalError) -> Message {
    let response = action.response().unwrap_or(Action::Error);
    match &err {
        ApprovalError::Persistence(source) => {
            warn!(action = %action, reason = err.reason(), error = %source, "Workflow step failed")
        }
        _ => warn!(action = %action, reason = err.reason(), error = %err, "Workflow step refused"),
    }
    Message::outcome(response, Outcome::failed(err.reason(), err.to_string()))
}
