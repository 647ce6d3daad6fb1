//! Login, logout, unblock, and keep-alive.

use std::sync::Arc;

use tracing::{debug, info};

use gcm_auth::LoginOutcome;
use gcm_core::{AppResult, ErrorKind};
use gcm_entity::user::UserRole;
use gcm_service::RequestContext;

use super::payload;
use crate::context::Services;
use crate::message::{Action, LoginResponse, Message, Outcome, Payload};

/// `LOGIN_REQUEST`
pub async fn login(
    services: Arc<Services>,
    ctx: RequestContext,
    message: Message,
) -> AppResult<Message> {
    let request = payload!(message, Login);
    debug!(connection_id = %ctx.connection_id, username = %request.username, "Login attempt");

    let outcome = services
        .login
        .login(&request.username, &request.password)
        .await?;
    Ok(Message::new(
        Action::LoginResponse,
        Payload::LoginResult(login_response(outcome, services.login.policy().lockout_duration)),
    ))
}

fn login_response(outcome: LoginOutcome, lockout: std::time::Duration) -> LoginResponse {
    let mut response = LoginResponse {
        success: outcome.is_success(),
        message: outcome.to_string(),
        user: None,
        session_id: None,
        remaining_attempts: None,
        lockout_seconds: None,
    };
    match outcome {
        LoginOutcome::Success { user, session_id } => {
            response.user = Some(user);
            response.session_id = Some(session_id);
        }
        LoginOutcome::InvalidPassword { remaining_attempts } => {
            response.remaining_attempts = Some(remaining_attempts);
        }
        LoginOutcome::Locked { lockout } => {
            response.remaining_attempts = Some(0);
            response.lockout_seconds = Some(lockout.as_secs());
        }
        LoginOutcome::Blocked => response.lockout_seconds = Some(lockout.as_secs()),
        LoginOutcome::UnknownUser => {}
    }
    response
}

/// `LOGOUT_REQUEST`. The connection drops its session when it sees the response.
pub async fn logout(
    _services: Arc<Services>,
    ctx: RequestContext,
    _message: Message,
) -> AppResult<Message> {
    let user = ctx.require_user()?;
    info!(connection_id = %ctx.connection_id, user_id = %user.id, "Logged out");
    Ok(Message::outcome(Action::LogoutResponse, Outcome::ok("Logged out")))
}

/// `UNBLOCK_USER`
pub async fn unblock_user(
    services: Arc<Services>,
    ctx: RequestContext,
    message: Message,
) -> AppResult<Message> {
    let actor = ctx.require_role(UserRole::CompanyManager)?;
    let request = payload!(message, Unblock);

    let outcome = match services.login.unblock(&request.username).await {
        Ok(true) => Outcome::ok(format!("Account '{}' unblocked", request.username)),
        Ok(false) => Outcome::ok(format!("Account '{}' was not blocked", request.username)),
        Err(e) if e.kind == ErrorKind::NotFound => Outcome::failed("not_found", e.message),
        Err(e) => return Err(e),
    };
    info!(
        actor_id = %actor.id,
        username = %request.username,
        success = outcome.success,
        "Unblock requested"
    );
    Ok(Message::outcome(Action::UnblockUserResponse, outcome))
}

/// `PING`
pub async fn ping(
    _services: Arc<Services>,
    ctx: RequestContext,
    _message: Message,
) -> AppResult<Message> {
    ctx.require_user()?;
    Ok(Message::empty(Action::Pong))
}
