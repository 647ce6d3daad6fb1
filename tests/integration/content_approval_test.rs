//! Integration tests for the catalog content approval workflow.

mod helpers;

use rust_decimal::Decimal;

use gcm_core::ErrorKind;
use gcm_core::types::{ContentRequestId, SiteId};
use gcm_database::{CatalogStore, CatalogTransaction};
use gcm_entity::approval::{ContentAction, ContentDetails, ContentType, RequestStatus};
use gcm_entity::catalog::{CityPatch, Map, MapPatch, SiteDraft};
use gcm_entity::user::{UserRole, UserSummary};
use gcm_protocol::message::{Action, Message, Payload};
use gcm_service::ContentSubmission;

use helpers::{TestApp, outcome};

fn edit_map_name(map: &Map, name: &str) -> ContentSubmission {
    ContentSubmission {
        action_type: ContentAction::Edit,
        content_type: ContentType::Map,
        target_id: Some(map.id.into_uuid()),
        target_name: map.name.clone(),
        details: ContentDetails::EditMap(MapPatch {
            name: Some(name.into()),
            description: None,
        }),
    }
}

async fn submit(app: &TestApp, user: &UserSummary, submission: ContentSubmission) -> Message {
    app.dispatch(
        app.context_for(user),
        Message::new(Action::SubmitContentChange, Payload::ContentChange(submission)),
    )
    .await
}

struct Staff {
    employee: UserSummary,
    editor: UserSummary,
}

async fn staff(app: &TestApp) -> Staff {
    Staff {
        employee: app.create_user("e@gcm.com", UserRole::Employee).await,
        editor: app.create_user("cm@gcm.com", UserRole::ContentManager).await,
    }
}

#[tokio::test]
async fn test_edit_applies_only_patched_fields() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let city = app.seed_city("Haifa").await;
    let map = app.seed_map(&city, "Downtown", Decimal::new(10, 0)).await;

    let response = submit(&app, &staff.employee, edit_map_name(&map, "Downtown & Port")).await;
    assert_eq!(response.action, Action::SubmitContentChangeResponse);
    let record_id = outcome(&response).record_id.unwrap();

    // Nothing changes until approval.
    let before = app.catalog.find_map(map.id).await.unwrap().unwrap();
    assert_eq!(before.name, "Downtown");

    let response = app
        .dispatch(app.context_for(&staff.editor), Message::empty(Action::GetPendingContent))
        .await;
    let Payload::PendingContent(pending) = response.payload else {
        panic!("unexpected payload");
    };
    assert_eq!(pending.count, 1);
    let view = &pending.records[0];
    assert_eq!(view.requester_name.as_deref(), Some("e"));
    assert!(matches!(view.details, ContentDetails::EditMap(_)));

    let response = app
        .decide(app.context_for(&staff.editor), Action::ApproveContent, record_id)
        .await;
    assert_eq!(response.action, Action::ApproveContentResponse);
    assert!(outcome(&response).success);

    let after = app.catalog.find_map(map.id).await.unwrap().unwrap();
    assert_eq!(after.name, "Downtown & Port");
    assert_eq!(after.description, before.description);
    assert_eq!(after.price, before.price);

    let record = app
        .catalog
        .find_content_request(ContentRequestId::from_uuid(record_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RequestStatus::Approved);
    assert_eq!(record.processed_by, Some(staff.editor.id));

    let response = app
        .decide(app.context_for(&staff.editor), Action::ApproveContent, record_id)
        .await;
    assert_eq!(outcome(&response).reason.as_deref(), Some("already_resolved"));
}

#[tokio::test]
async fn test_deny_leaves_target() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let city = app.seed_city("Acre").await;
    let map = app.seed_map(&city, "Walls", Decimal::new(10, 0)).await;

    let response = submit(&app, &staff.employee, edit_map_name(&map, "Ramparts")).await;
    let record_id = outcome(&response).record_id.unwrap();

    let response = app
        .decide(app.context_for(&staff.editor), Action::DenyContent, record_id)
        .await;
    assert_eq!(response.action, Action::DenyContentResponse);
    assert!(outcome(&response).success);

    assert_eq!(app.catalog.find_map(map.id).await.unwrap().unwrap().name, "Walls");
    let record = app
        .catalog
        .find_content_request(ContentRequestId::from_uuid(record_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RequestStatus::Denied);
}

#[tokio::test]
async fn test_add_site() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let city = app.seed_city("Haifa").await;

    let response = submit(
        &app,
        &staff.employee,
        ContentSubmission {
            action_type: ContentAction::Add,
            content_type: ContentType::Site,
            target_id: None,
            target_name: "Bahai Gardens".into(),
            details: ContentDetails::AddSite(SiteDraft {
                city_id: city.id,
                name: "Bahai Gardens".into(),
                description: "Terraces".into(),
                category: "garden".into(),
                accessible: false,
                visit_minutes: 120,
            }),
        },
    )
    .await;
    let record_id = outcome(&response).record_id.unwrap();

    let response = app
        .decide(app.context_for(&staff.editor), Action::ApproveContent, record_id)
        .await;
    let approved = outcome(&response);
    assert!(approved.success);

    let site_id = SiteId::from_uuid(approved.target_id.unwrap());
    let site = app.catalog.find_site(site_id).await.unwrap().unwrap();
    assert_eq!(site.city_id, city.id);
    assert_eq!(site.visit_minutes, 120);

    // The stored request records which site it created.
    let record = app
        .catalog
        .find_content_request(ContentRequestId::from_uuid(record_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.target_id, approved.target_id);
    assert_eq!(record.status, RequestStatus::Approved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decisions_have_one_winner() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let other = app.create_user("cm2@gcm.com", UserRole::ContentManager).await;
    let city = app.seed_city("Safed").await;
    let map = app.seed_map(&city, "Alleys", Decimal::new(10, 0)).await;

    let response = submit(&app, &staff.employee, edit_map_name(&map, "Artists Quarter")).await;
    let record_id = outcome(&response).record_id.unwrap();

    let (approve, deny) = tokio::join!(
        app.decide(app.context_for(&staff.editor), Action::ApproveContent, record_id),
        app.decide(app.context_for(&other), Action::DenyContent, record_id),
    );
    let (approve, deny) = (outcome(&approve), outcome(&deny));
    assert_ne!(approve.success, deny.success);
    let loser = if approve.success { deny } else { approve };
    assert_eq!(loser.reason.as_deref(), Some("already_resolved"));

    let record = app
        .catalog
        .find_content_request(ContentRequestId::from_uuid(record_id))
        .await
        .unwrap()
        .unwrap();
    let live = app.catalog.find_map(map.id).await.unwrap().unwrap();
    if approve.success {
        assert_eq!(record.status, RequestStatus::Approved);
        assert_eq!(live.name, "Artists Quarter");
    } else {
        assert_eq!(record.status, RequestStatus::Denied);
        assert_eq!(live.name, "Alleys");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_apply_once() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let other = app.create_user("cm2@gcm.com", UserRole::ContentManager).await;
    let city = app.seed_city("Tel Aviv").await;

    let response = submit(
        &app,
        &staff.employee,
        ContentSubmission {
            action_type: ContentAction::Add,
            content_type: ContentType::Site,
            target_id: None,
            target_name: "Carmel Market".into(),
            details: ContentDetails::AddSite(SiteDraft {
                city_id: city.id,
                name: "Carmel Market".into(),
                description: String::new(),
                category: "market".into(),
                accessible: true,
                visit_minutes: 60,
            }),
        },
    )
    .await;
    let record_id = outcome(&response).record_id.unwrap();

    let (a, b) = tokio::join!(
        app.decide(app.context_for(&staff.editor), Action::ApproveContent, record_id),
        app.decide(app.context_for(&other), Action::ApproveContent, record_id),
    );
    let wins = [&a, &b].iter().filter(|m| outcome(m).success).count();
    assert_eq!(wins, 1);

    // Only the winning approval created a site.
    let mut tx = app.catalog.begin().await.unwrap();
    assert_eq!(tx.count_city_dependents(city.id).await.unwrap(), 1);
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_target_disappeared() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let city = app.seed_city("Eilat").await;
    let map = app.seed_map(&city, "Reef", Decimal::new(10, 0)).await;

    let edit = submit(&app, &staff.employee, edit_map_name(&map, "Coral Reef")).await;
    let delete = submit(
        &app,
        &staff.employee,
        ContentSubmission {
            action_type: ContentAction::Delete,
            content_type: ContentType::Map,
            target_id: Some(map.id.into_uuid()),
            target_name: map.name.clone(),
            details: ContentDetails::DeleteMap,
        },
    )
    .await;

    let response = app
        .decide(
            app.context_for(&staff.editor),
            Action::ApproveContent,
            outcome(&delete).record_id.unwrap(),
        )
        .await;
    assert!(outcome(&response).success);
    assert!(app.catalog.find_map(map.id).await.unwrap().is_none());

    let edit_id = outcome(&edit).record_id.unwrap();
    let response = app
        .decide(app.context_for(&staff.editor), Action::ApproveContent, edit_id)
        .await;
    let failed = outcome(&response);
    assert!(!failed.success);
    assert_eq!(failed.reason.as_deref(), Some("target_missing"));

    // The failed approval left the request open.
    let record = app
        .catalog
        .find_content_request(ContentRequestId::from_uuid(edit_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RequestStatus::Open);
}

#[tokio::test]
async fn test_city_with_maps_cannot_be_deleted() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let city = app.seed_city("Jerusalem").await;
    app.seed_map(&city, "Old City", Decimal::new(10, 0)).await;

    let response = submit(
        &app,
        &staff.employee,
        ContentSubmission {
            action_type: ContentAction::Delete,
            content_type: ContentType::City,
            target_id: Some(city.id.into_uuid()),
            target_name: city.name.clone(),
            details: ContentDetails::DeleteCity,
        },
    )
    .await;
    let record_id = outcome(&response).record_id.unwrap();

    let response = app
        .decide(app.context_for(&staff.editor), Action::ApproveContent, record_id)
        .await;
    assert_eq!(outcome(&response).reason.as_deref(), Some("conflict"));
    assert!(app.catalog.find_city(city.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_mismatched_details_rejected() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let city = app.seed_city("Haifa").await;

    let response = submit(
        &app,
        &staff.employee,
        ContentSubmission {
            action_type: ContentAction::Edit,
            content_type: ContentType::Map,
            target_id: Some(city.id.into_uuid()),
            target_name: city.name.clone(),
            details: ContentDetails::EditCity(CityPatch {
                name: Some("Hefa".into()),
                description: None,
            }),
        },
    )
    .await;
    let rejected = outcome(&response);
    assert!(!rejected.success);
    assert_eq!(rejected.reason.as_deref(), Some("validation"));
}

#[tokio::test]
async fn test_customers_cannot_submit() {
    let app = TestApp::new().await;
    let customer = app.create_user("c@x.com", UserRole::Customer).await;
    let city = app.seed_city("Haifa").await;
    let map = app.seed_map(&city, "Downtown", Decimal::new(10, 0)).await;

    let response = submit(&app, &customer, edit_map_name(&map, "X")).await;
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_employees_cannot_decide() {
    let app = TestApp::new().await;
    let staff = staff(&app).await;
    let city = app.seed_city("Haifa").await;
    let map = app.seed_map(&city, "Downtown", Decimal::new(10, 0)).await;

    let response = submit(&app, &staff.employee, edit_map_name(&map, "Center")).await;
    let record_id = outcome(&response).record_id.unwrap();

    let response = app
        .decide(app.context_for(&staff.employee), Action::ApproveContent, record_id)
        .await;
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::Authorization);
}
