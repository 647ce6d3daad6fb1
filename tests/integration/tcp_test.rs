//! End-to-end tests over a real TCP socket.

mod helpers;

use std::time::Duration;

use rust_decimal::Decimal;

use gcm_core::ErrorKind;
use gcm_entity::user::UserRole;
use gcm_protocol::message::{Action, Payload};

use helpers::{PASSWORD, TestApp, outcome};

#[tokio::test]
async fn test_login_binds_session_to_connection() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", UserRole::Customer).await;
    let (addr, _server) = app.spawn_server().await;
    let mut client = app.client(addr).await;

    let response = client.ping().await.unwrap();
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::Authentication);

    let login = client.login("a@x.com", PASSWORD).await.unwrap();
    assert!(login.success);
    assert_eq!(client.ping().await.unwrap().action, Action::Pong);

    // A second connection has its own, empty session.
    let mut other = app.client(addr).await;
    assert!(other.ping().await.unwrap().is_error());

    let response = client.logout().await.unwrap();
    assert_eq!(response.action, Action::LogoutResponse);
    assert!(client.ping().await.unwrap().is_error());
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", UserRole::Customer).await;
    let (addr, _server) = app.spawn_server().await;
    let mut client = app.client(addr).await;

    let response = client.request_raw(&b"{\"action\": 42"[..]).await.unwrap();
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::Protocol);

    let response = client
        .request_raw(&br#"{"action":"LOGIN_REQUEST","payload":{"type":"login"}}"#[..])
        .await
        .unwrap();
    assert!(response.is_error());

    assert!(client.login("a@x.com", PASSWORD).await.unwrap().success);
    assert_eq!(client.ping().await.unwrap().action, Action::Pong);
}

#[tokio::test]
async fn test_price_scenario_over_tcp() {
    let app = TestApp::new().await;
    app.create_user("cm@gcm.com", UserRole::ContentManager).await;
    app.create_user("boss@gcm.com", UserRole::CompanyManager).await;
    let city = app.seed_city("Haifa").await;
    let map = app.seed_map(&city, "Carmel", Decimal::new(10, 0)).await;
    let (addr, _server) = app.spawn_server().await;

    let mut editor = app.client(addr).await;
    assert!(editor.login("cm@gcm.com", PASSWORD).await.unwrap().success);
    let response = editor.submit_price(map.id, Decimal::new(15, 0)).await.unwrap();
    let record_id = outcome(&response).record_id.unwrap();

    let mut boss = app.client(addr).await;
    assert!(boss.login("boss@gcm.com", PASSWORD).await.unwrap().success);
    let response = boss
        .request(gcm_protocol::Message::empty(Action::GetPendingApprovals))
        .await
        .unwrap();
    let Payload::PendingPrices(pending) = response.payload else {
        panic!("unexpected payload");
    };
    assert_eq!(pending.records[0].requester_name.as_deref(), Some("cm"));

    let response = boss.decide(Action::ApprovePending, record_id).await.unwrap();
    assert!(outcome(&response).success);
    assert_eq!(app.map_price(map.id).await, Decimal::new(15, 0));

    let response = boss.decide(Action::ApprovePending, record_id).await.unwrap();
    assert!(!outcome(&response).success);
}

#[tokio::test]
async fn test_shutdown_closes_server_and_connections() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", UserRole::Customer).await;
    let (addr, server) = app.spawn_server().await;
    let mut client = app.client(addr).await;
    assert!(client.login("a@x.com", PASSWORD).await.unwrap().success);

    app.context.shutdown().await;
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    assert!(client.ping().await.is_err());
}
