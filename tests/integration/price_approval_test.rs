//! Integration tests for the map price approval workflow.

mod helpers;

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use gcm_core::ErrorKind;
use gcm_core::types::PriceUpdateId;
use gcm_database::CatalogStore;
use gcm_entity::approval::{Decision, RequestStatus};
use gcm_entity::user::UserRole;
use gcm_protocol::message::{Action, Message, Payload, PriceChangeRequest};

use helpers::{TestApp, outcome};

fn price(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn submit(map_id: gcm_core::types::MapId, new_price: &str) -> Message {
    Message::new(
        Action::SubmitPriceChange,
        Payload::PriceChange(PriceChangeRequest {
            map_id,
            new_price: price(new_price),
        }),
    )
}

#[tokio::test]
async fn test_submit_then_approve() {
    let app = TestApp::new().await;
    let editor = app.create_user("cm@gcm.com", UserRole::ContentManager).await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;
    let city = app.seed_city("Haifa").await;
    let map = app.seed_map(&city, "Haifa Center", price("10")).await;

    let response = app.dispatch(app.context_for(&editor), submit(map.id, "15")).await;
    assert_eq!(response.action, Action::SubmitPriceChangeResponse);
    let submitted = outcome(&response);
    assert!(submitted.success);
    let record_id = submitted.record_id.unwrap();

    // Submitting never touches the live price.
    assert_eq!(app.map_price(map.id).await, price("10"));

    let response = app
        .dispatch(app.context_for(&boss), Message::empty(Action::GetPendingApprovals))
        .await;
    let Payload::PendingPrices(pending) = response.payload else {
        panic!("unexpected payload");
    };
    assert_eq!(pending.count, 1);
    let view = &pending.records[0];
    assert_eq!(view.old_price, price("10"));
    assert_eq!(view.new_price, price("15"));
    assert_eq!(view.map_name.as_deref(), Some("Haifa Center"));
    assert_eq!(view.city_name.as_deref(), Some("Haifa"));

    let response = app
        .decide(app.context_for(&boss), Action::ApprovePending, record_id)
        .await;
    assert_eq!(response.action, Action::ApprovePendingResponse);
    assert!(outcome(&response).success);
    assert_eq!(app.map_price(map.id).await, price("15"));

    let record = app
        .catalog
        .find_price_update(PriceUpdateId::from_uuid(record_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RequestStatus::Closed);
    assert_eq!(record.resolution, Some(Decision::Approve));
    assert_eq!(record.processed_by, Some(boss.id));
    assert!(record.processed_at.is_some());

    // A second approval fails and does not re-apply.
    let response = app
        .decide(app.context_for(&boss), Action::ApprovePending, record_id)
        .await;
    let again = outcome(&response);
    assert!(!again.success);
    assert_eq!(again.reason.as_deref(), Some("already_resolved"));

    let response = app
        .dispatch(app.context_for(&boss), Message::empty(Action::GetPendingApprovals))
        .await;
    let Payload::PendingPrices(pending) = response.payload else {
        panic!("unexpected payload");
    };
    assert_eq!(pending.count, 0);
}

#[tokio::test]
async fn test_deny_keeps_price() {
    let app = TestApp::new().await;
    let editor = app.create_user("cm@gcm.com", UserRole::ContentManager).await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;
    let city = app.seed_city("Acre").await;
    let map = app.seed_map(&city, "Old City", price("20.00")).await;

    let response = app.dispatch(app.context_for(&editor), submit(map.id, "25.50")).await;
    let record_id = outcome(&response).record_id.unwrap();

    let response = app
        .decide(app.context_for(&boss), Action::DenyPending, record_id)
        .await;
    assert_eq!(response.action, Action::DenyPendingResponse);
    assert!(outcome(&response).success);
    assert_eq!(app.map_price(map.id).await, price("20.00"));

    let record = app
        .catalog
        .find_price_update(PriceUpdateId::from_uuid(record_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RequestStatus::Closed);
    assert_eq!(record.resolution, Some(Decision::Deny));

    let response = app
        .decide(app.context_for(&boss), Action::ApprovePending, record_id)
        .await;
    assert!(!outcome(&response).success);
    assert_eq!(app.map_price(map.id).await, price("20.00"));
}

#[tokio::test]
async fn test_competing_proposals_coexist() {
    let app = TestApp::new().await;
    let editor = app.create_user("cm@gcm.com", UserRole::ContentManager).await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;
    let city = app.seed_city("Eilat").await;
    let map = app.seed_map(&city, "Beaches", price("10")).await;

    let first = app.dispatch(app.context_for(&editor), submit(map.id, "12")).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = app.dispatch(app.context_for(&editor), submit(map.id, "14")).await;
    let first_id = outcome(&first).record_id.unwrap();
    let second_id = outcome(&second).record_id.unwrap();

    let response = app
        .dispatch(app.context_for(&boss), Message::empty(Action::GetPendingApprovals))
        .await;
    let Payload::PendingPrices(pending) = response.payload else {
        panic!("unexpected payload");
    };
    assert_eq!(pending.count, 2);
    assert_eq!(pending.records[0].id.into_uuid(), second_id);

    app.decide(app.context_for(&boss), Action::ApprovePending, second_id)
        .await;
    app.decide(app.context_for(&boss), Action::ApprovePending, first_id)
        .await;
    assert_eq!(app.map_price(map.id).await, price("12"));
}

#[tokio::test]
async fn test_invalid_proposals() {
    let app = TestApp::new().await;
    let editor = app.create_user("cm@gcm.com", UserRole::ContentManager).await;
    let city = app.seed_city("Safed").await;
    let map = app.seed_map(&city, "Alleys", price("10")).await;

    for bad in ["0", "-5", "10.001"] {
        let response = app.dispatch(app.context_for(&editor), submit(map.id, bad)).await;
        let result = outcome(&response);
        assert!(!result.success, "{bad} accepted");
        assert_eq!(result.reason.as_deref(), Some("validation"));
    }

    let response = app
        .dispatch(
            app.context_for(&editor),
            submit(gcm_core::types::MapId::new(), "12"),
        )
        .await;
    assert_eq!(outcome(&response).reason.as_deref(), Some("target_missing"));
}

#[tokio::test]
async fn test_unknown_record() {
    let app = TestApp::new().await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;
    let response = app
        .decide(app.context_for(&boss), Action::DenyPending, Uuid::new_v4())
        .await;
    assert_eq!(outcome(&response).reason.as_deref(), Some("not_found"));
}

#[tokio::test]
async fn test_employee_cannot_propose_prices() {
    let app = TestApp::new().await;
    let employee = app.create_user("e@gcm.com", UserRole::Employee).await;
    let city = app.seed_city("Jaffa").await;
    let map = app.seed_map(&city, "Port", price("10")).await;

    let response = app.dispatch(app.context_for(&employee), submit(map.id, "12")).await;
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_outage_reports_persistence() {
    let app = TestApp::new().await;
    let editor = app.create_user("cm@gcm.com", UserRole::ContentManager).await;
    let city = app.seed_city("Tiberias").await;
    let map = app.seed_map(&city, "Lake", price("10")).await;

    app.catalog.set_unavailable(true);
    let response = app.dispatch(app.context_for(&editor), submit(map.id, "12")).await;
    assert_eq!(outcome(&response).reason.as_deref(), Some("persistence"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_have_one_winner() {
    let app = TestApp::new().await;
    let editor = app.create_user("cm@gcm.com", UserRole::ContentManager).await;
    let boss = app.create_user("boss@gcm.com", UserRole::CompanyManager).await;
    let other = app.create_user("boss2@gcm.com", UserRole::CompanyManager).await;
    let city = app.seed_city("Nazareth").await;
    let map = app.seed_map(&city, "Basilica", price("10")).await;

    let response = app.dispatch(app.context_for(&editor), submit(map.id, "15")).await;
    let record_id = outcome(&response).record_id.unwrap();

    let (a, b) = tokio::join!(
        app.decide(app.context_for(&boss), Action::ApprovePending, record_id),
        app.decide(app.context_for(&other), Action::ApprovePending, record_id),
    );
    let wins = [&a, &b]
        .iter()
        .filter(|m| outcome(m).success)
        .count();
    assert_eq!(wins, 1);
    assert_eq!(app.map_price(map.id).await, price("15"));
}
