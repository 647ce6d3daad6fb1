//! Integration tests for login, lockout, and unblocking.

mod helpers;

use std::time::Duration;

use gcm_core::ErrorKind;
use gcm_database::UserStore;
use gcm_entity::user::UserRole;
use gcm_protocol::message::{
    Action, LoginRequest, LoginResponse, Message, Payload, UnblockRequest,
};

use helpers::{PASSWORD, TestApp};

async fn login(app: &TestApp, username: &str, password: &str) -> LoginResponse {
    let response = app
        .dispatch(
            app.anonymous(),
            Message::new(
                Action::LoginRequest,
                Payload::Login(LoginRequest {
                    username: username.into(),
                    password: password.into(),
                }),
            ),
        )
        .await;
    assert_eq!(response.action, Action::LoginResponse, "{response:?}");
    match response.payload {
        Payload::LoginResult(result) => result,
        other => panic!("unexpected payload: {other:?}"),
    }
}

fn unblock_request(username: &str) -> Message {
    Message::new(
        Action::UnblockUser,
        Payload::Unblock(UnblockRequest {
            username: username.into(),
        }),
    )
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new().await;
    let user = app.create_user("a@x.com", UserRole::Customer).await;

    let result = login(&app, "A@X.com", PASSWORD).await;
    assert!(result.success);
    assert_eq!(result.user.unwrap().id, user.id);
    assert!(result.session_id.is_some());

    let stored = app.users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn test_unknown_user() {
    let app = TestApp::new().await;
    let result = login(&app, "nobody@x.com", PASSWORD).await;
    assert!(!result.success);
    assert_eq!(result.message, "User not found");
    assert!(result.remaining_attempts.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_lockout_then_timed_unblock() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", UserRole::Customer).await;

    for expected in [2, 1] {
        let result = login(&app, "a@x.com", "wrong").await;
        assert!(!result.success);
        assert_eq!(result.remaining_attempts, Some(expected));
    }

    let result = login(&app, "a@x.com", "wrong").await;
    assert!(!result.success);
    assert_eq!(result.lockout_seconds, Some(30));
    assert!(result.message.contains("30 seconds"));

    // Correct password is refused while blocked and the counter is untouched.
    let result = login(&app, "a@x.com", PASSWORD).await;
    assert!(!result.success);
    assert!(result.message.contains("blocked"));
    let stored = app.users.find_by_username("a@x.com").await.unwrap().unwrap();
    assert!(stored.is_blocked);
    assert_eq!(stored.failed_attempts, 3);

    tokio::time::sleep(Duration::from_secs(31)).await;

    let stored = app.users.find_by_username("a@x.com").await.unwrap().unwrap();
    assert!(!stored.is_blocked);
    assert_eq!(stored.failed_attempts, 0);

    let result = login(&app, "a@x.com", PASSWORD).await;
    assert!(result.success);
    assert!(result.session_id.is_some());
}

#[tokio::test]
async fn test_success_resets_counter() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", UserRole::Customer).await;

    login(&app, "a@x.com", "wrong").await;
    login(&app, "a@x.com", "wrong").await;
    assert!(login(&app, "a@x.com", PASSWORD).await.success);

    let result = login(&app, "a@x.com", "wrong").await;
    assert_eq!(result.remaining_attempts, Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_manual_unblock_by_company_manager() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", UserRole::Customer).await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;

    for _ in 0..3 {
        login(&app, "a@x.com", "wrong").await;
    }

    let response = app.dispatch(app.context_for(&boss), unblock_request("a@x.com")).await;
    assert_eq!(response.action, Action::UnblockUserResponse);
    assert!(helpers::outcome(&response).success);

    assert!(login(&app, "a@x.com", PASSWORD).await.success);

    // The first timer still fires and leaves the account active.
    tokio::time::sleep(Duration::from_secs(31)).await;
    let stored = app.users.find_by_username("a@x.com").await.unwrap().unwrap();
    assert!(!stored.is_blocked);
}

#[tokio::test]
async fn test_unblock_requires_company_manager() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", UserRole::Customer).await;
    let editor = app.create_user("cm@gcm.com", UserRole::ContentManager).await;

    let response = app
        .dispatch(app.context_for(&editor), unblock_request("a@x.com"))
        .await;
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::Authorization);

    let response = app.dispatch(app.anonymous(), unblock_request("a@x.com")).await;
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::Authentication);
}

#[tokio::test]
async fn test_unblock_unknown_account() {
    let app = TestApp::new().await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;

    let response = app
        .dispatch(app.context_for(&boss), unblock_request("ghost@x.com"))
        .await;
    let outcome = helpers::outcome(&response);
    assert!(!outcome.success);
    assert_eq!(outcome.reason.as_deref(), Some("not_found"));
}

#[tokio::test(start_paused = true)]
async fn test_unblock_timers_resume_after_restart() {
    let first = TestApp::new().await;
    first.create_user("a@x.com", UserRole::Customer).await;
    for _ in 0..3 {
        login(&first, "a@x.com", "wrong").await;
    }
    first.context.shutdown().await;

    let second = TestApp::with_stores(
        first.config.clone(),
        first.users.clone(),
        first.catalog.clone(),
    );
    assert_eq!(second.context.resume_background_tasks().await.unwrap(), 1);
    assert!(!login(&second, "a@x.com", PASSWORD).await.success);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(login(&second, "a@x.com", PASSWORD).await.success);
}

#[tokio::test]
async fn test_store_outage_answers_error() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", UserRole::Customer).await;
    app.users.set_unavailable(true);

    let response = app
        .dispatch(
            app.anonymous(),
            Message::new(
                Action::LoginRequest,
                Payload::Login(LoginRequest {
                    username: "a@x.com".into(),
                    password: PASSWORD.into(),
                }),
            ),
        )
        .await;
    assert_eq!(
        response.as_error().unwrap().kind,
        ErrorKind::ServiceUnavailable
    );
}
