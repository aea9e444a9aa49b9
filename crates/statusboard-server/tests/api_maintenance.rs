mod common;

use axum::http::StatusCode;
use chrono::{Duration, Local};
use common::setup_app;
use serde_json::{json, Value};

fn in_hours(hours: i64) -> String {
    (Local::now().fixed_offset() + Duration::hours(hours)).to_rfc3339()
}

async fn schedule(app: &common::TestApp, start: i64, end: i64) -> Value {
    let (status, body) = app
        .send(
            "POST",
            "/v1/scheduled-maintenance",
            Some(json!({
                "title": "Database upgrade",
                "planned_start": in_hours(start),
                "planned_end": in_hours(end),
                "services": [{"name": "chat", "status": "Scheduled Maintenance", "regions": ["us-1"]}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn past_windows_are_rejected() {
    let app = setup_app();

    let (status, body) = app
        .send(
            "POST",
            "/v1/scheduled-maintenance",
            Some(json!({
                "planned_start": in_hours(-2),
                "planned_end": in_hours(2)
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("future"));
}

#[tokio::test]
async fn scheduling_leaves_services_alone_until_an_update() {
    let app = setup_app();
    let created = schedule(&app, 2, 4).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["completed"], false);

    let (_, chat) = app.get("/v1/services/chat").await;
    assert_eq!(chat["status"], "Nominal");

    let (status, updated) = app
        .send(
            "POST",
            &format!("/v1/scheduled-maintenance/{id}/updates"),
            Some(json!({
                "status": "Scheduled Maintenance",
                "message": "Starting",
                "services": [{"name": "chat", "status": "Scheduled Maintenance", "regions": ["us-1"]}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(updated["updates"][0]["id"], 0);

    let (_, chat) = app.get("/v1/services/chat").await;
    assert_eq!(chat["status"], "Scheduled Maintenance");

    let (_, done) = app
        .send(
            "POST",
            &format!("/v1/scheduled-maintenance/{id}/updates"),
            Some(json!({"status": "resolved", "message": "Done"})),
        )
        .await;
    assert_eq!(done["completed"], true);

    let (_, chat) = app.get("/v1/services/chat").await;
    assert_eq!(chat["status"], "Nominal");
}

#[tokio::test]
async fn patch_changes_only_supplied_fields() {
    let app = setup_app();
    let created = schedule(&app, 2, 4).await;
    let id = created["id"].as_i64().unwrap();

    let (status, patched) = app
        .send(
            "PATCH",
            &format!("/v1/scheduled-maintenance/{id}"),
            Some(json!({"title": "Renamed", "description": "", "completed": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["title"], "Renamed");
    assert_eq!(patched["planned_start"], created["planned_start"]);
    assert_eq!(patched["completed"], false);

    let (status, _) = app
        .send(
            "PATCH",
            &format!("/v1/scheduled-maintenance/{id}"),
            Some(json!({"planned_end": in_hours(-1)})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "PATCH",
            "/v1/scheduled-maintenance/404",
            Some(json!({"title": "Nobody"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upcoming_returns_the_newest_pending_work() {
    let app = setup_app();

    let (status, _) = app.get("/v1/scheduled-maintenance/upcoming").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    schedule(&app, 1, 2).await;
    let second = schedule(&app, 24, 26).await;

    let (status, upcoming) = app.get("/v1/scheduled-maintenance/upcoming").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upcoming["id"], second["id"]);

    let (_, listed) = app.get("/v1/scheduled-maintenance").await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (_, dashboard) = app.get("/v1/dashboard").await;
    assert_eq!(dashboard["scheduled_maintenance"]["count"], 2);
}

#[tokio::test]
async fn delete_maintenance_and_updates() {
    let app = setup_app();
    let created = schedule(&app, 2, 4).await;
    let id = created["id"].as_i64().unwrap();
    app.send(
        "POST",
        &format!("/v1/scheduled-maintenance/{id}/updates"),
        Some(json!({"status": "update", "message": "On track"})),
    )
    .await;

    let (status, update) = app
        .get(&format!("/v1/scheduled-maintenance/{id}/updates/0"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(update["message"], "On track");

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/v1/scheduled-maintenance/{id}/updates/0"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, updates) = app
        .get(&format!("/v1/scheduled-maintenance/{id}/updates"))
        .await;
    assert!(updates.as_array().unwrap().is_empty());

    let (status, _) = app
        .send("DELETE", &format!("/v1/scheduled-maintenance/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/v1/scheduled-maintenance/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
