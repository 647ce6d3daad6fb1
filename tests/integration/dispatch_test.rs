//! Integration tests for action routing and authorization.

mod helpers;

use std::time::Duration;

use gcm_core::{AppError, AppResult, ErrorKind};
use gcm_entity::user::UserRole;
use gcm_protocol::HandlerRegistry;
use gcm_protocol::message::{Action, Message, Payload, UnblockRequest};
use gcm_service::RequestContext;

use helpers::TestApp;

#[tokio::test]
async fn test_unregistered_action_returns_error() {
    let app = TestApp::new().await;
    let user = app.create_user("e@gcm.com", UserRole::Employee).await;

    let message: Message =
        serde_json::from_str(r#"{"action":"PURCHASE_SUBSCRIPTION","payload":{"type":"empty"}}"#)
            .unwrap();
    let response = app.dispatch(app.context_for(&user), message).await;
    let error = response.as_error().unwrap();
    assert_eq!(error.kind, ErrorKind::Protocol);
    assert!(error.description.contains("Unknown action"));
}

#[tokio::test]
async fn test_response_codes_are_not_routable() {
    let app = TestApp::new().await;
    let user = app.create_user("e@gcm.com", UserRole::Employee).await;
    let response = app
        .dispatch(app.context_for(&user), Message::empty(Action::Pong))
        .await;
    assert!(response.is_error());
}

#[tokio::test]
async fn test_ping() {
    let app = TestApp::new().await;
    let user = app.create_user("c@x.com", UserRole::Customer).await;
    let response = app
        .dispatch(app.context_for(&user), Message::empty(Action::Ping))
        .await;
    assert_eq!(response.action, Action::Pong);
}

#[tokio::test]
async fn test_requests_need_a_session() {
    let app = TestApp::new().await;
    for action in Action::REQUESTS {
        if action == Action::LoginRequest {
            continue;
        }
        let response = app.dispatch(app.anonymous(), Message::empty(action)).await;
        let error = response
            .as_error()
            .unwrap_or_else(|| panic!("{action} answered {response:?}"));
        assert!(
            matches!(error.kind, ErrorKind::Authentication | ErrorKind::Protocol),
            "{action}: {error:?}"
        );
    }
}

#[tokio::test]
async fn test_role_requirements() {
    let app = TestApp::new().await;
    let customer = app.create_user("c@x.com", UserRole::Customer).await;
    let employee = app.create_user("e@gcm.com", UserRole::Employee).await;
    let editor = app.create_user("cm@gcm.com", UserRole::ContentManager).await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;

    let cases = [
        (Action::GetPendingContent, &employee, false),
        (Action::GetPendingContent, &editor, true),
        (Action::GetPendingApprovals, &editor, false),
        (Action::GetPendingApprovals, &boss, true),
        (Action::GetPendingContent, &customer, false),
    ];
    for (action, user, allowed) in cases {
        let response = app
            .dispatch(app.context_for(user), Message::empty(action))
            .await;
        if allowed {
            assert!(!response.is_error(), "{action} as {}: {response:?}", user.role);
        } else {
            assert_eq!(
                response.as_error().unwrap().kind,
                ErrorKind::Authorization,
                "{action} as {}",
                user.role
            );
        }
    }
}

#[tokio::test]
async fn test_wrong_payload_is_protocol_error() {
    let app = TestApp::new().await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;

    let response = app
        .dispatch(
            app.context_for(&boss),
            Message::new(
                Action::ApprovePending,
                Payload::Unblock(UnblockRequest {
                    username: "x".into(),
                }),
            ),
        )
        .await;
    let error = response.as_error().unwrap();
    assert_eq!(error.kind, ErrorKind::Protocol);
    assert!(error.description.contains("RecordRef"));
}

async fn explode(_: RequestContext, _: Message) -> AppResult<Message> {
    panic!("handler bug")
}

async fn refuse(_: RequestContext, _: Message) -> AppResult<Message> {
    Err(AppError::conflict("already there"))
}

#[tokio::test]
async fn test_panicking_handler_answers_error() {
    let app = TestApp::new().await;
    let mut registry = HandlerRegistry::new(Duration::from_secs(1));
    registry.register(Action::Ping, explode);
    registry.register(Action::LogoutRequest, refuse);

    let response = registry
        .dispatch(app.anonymous(), Message::empty(Action::Ping))
        .await;
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::Internal);

    let response = registry
        .dispatch(app.anonymous(), Message::empty(Action::LogoutRequest))
        .await;
    let error = response.as_error().unwrap();
    assert_eq!(error.kind, ErrorKind::Conflict);
    assert_eq!(error.description, "already there");
}

#[tokio::test]
async fn test_logout_requires_session() {
    let app = TestApp::new().await;
    let user = app.create_user("c@x.com", UserRole::Customer).await;

    let response = app
        .dispatch(app.context_for(&user), Message::empty(Action::LogoutRequest))
        .await;
    assert_eq!(response.action, Action::LogoutResponse);
    assert!(helpers::outcome(&response).success);
}
