mod common;

use axum::http::StatusCode;
use common::setup_app;
use serde_json::json;

#[tokio::test]
async fn health_check_returns_ok() {
    let app = setup_app();

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_and_fetch_incident() {
    let app = setup_app();

    let (status, created) = app
        .send(
            "POST",
            "/v1/incidents",
            Some(json!({
                "title": "Messages delayed",
                "status": "identified",
                "services": [{"name": "chat", "status": "Degraded", "regions": ["eu-1"]}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Identified");
    assert_eq!(created["updates"][0]["message"], "Initial status of Identified");

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = app.get(&format!("/v1/incidents/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Messages delayed");

    let (_, chat) = app.get("/v1/services/chat").await;
    assert_eq!(chat["status"], "Degraded");
    let (_, regions) = app.get("/v1/services/chat/regions").await;
    let eu = regions
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["code"] == "eu-1")
        .unwrap();
    assert_eq!(eu["status"], "Degraded");
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let app = setup_app();

    let (status, body) = app
        .send(
            "POST",
            "/v1/incidents",
            Some(json!({"status": "Scheduled Maintenance"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, created) = app
        .send("POST", "/v1/incidents", Some(json!({"title": "x"})))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            "POST",
            &format!("/v1/incidents/{id}/updates"),
            Some(json!({"status": "update", "message": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_incidents_are_not_found() {
    let app = setup_app();

    let (status, _) = app.get("/v1/incidents/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/v1/incidents/99/updates").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "POST",
            "/v1/incidents/99/updates",
            Some(json!({"status": "update", "message": "hello"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_log_round_trip() {
    let app = setup_app();
    let (_, created) = app
        .send(
            "POST",
            "/v1/incidents",
            Some(json!({
                "title": "API errors",
                "services": [{"name": "api", "status": "Outage"}]
            })),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, resolved) = app
        .send(
            "POST",
            &format!("/v1/incidents/{id}/updates"),
            Some(json!({"status": "RESOLVED", "message": "Fixed"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resolved["status"], "Resolved");
    assert_eq!(resolved["services"][0]["status"], "Nominal");

    let (_, api) = app.get("/v1/services/api").await;
    assert_eq!(api["status"], "Nominal");

    let (status, update) = app.get(&format!("/v1/incidents/{id}/updates/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(update["message"], "Fixed");

    let (status, _) = app
        .send("DELETE", &format!("/v1/incidents/{id}/updates/1"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/v1/incidents/{id}/updates/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, updates) = app.get(&format!("/v1/incidents/{id}/updates")).await;
    assert_eq!(updates.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send("DELETE", &format!("/v1/incidents/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/v1/incidents/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_pages_and_tolerates_bad_numbers() {
    let app = setup_app();
    for n in 0..30 {
        app.send(
            "POST",
            "/v1/incidents",
            Some(json!({"title": format!("incident {n}")})),
        )
        .await;
    }

    let (status, first) = app.get("/v1/incidents?limit=abc").await;
    assert_eq!(status, StatusCode::OK);
    let first = first.as_array().unwrap();
    assert_eq!(first.len(), 25);
    assert_eq!(first[0]["id"], 30);

    let (_, second) = app.get("/v1/incidents?all=true&limit=10&page=2").await;
    let ids: Vec<i64> = second
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, (1..=10).rev().collect::<Vec<_>>());

    let (status, history) = app.get("/v1/history?page=0").await;
    assert_eq!(status, StatusCode::OK);
    let total: usize = history
        .as_array()
        .unwrap()
        .iter()
        .map(|day| day["entries"].as_array().unwrap().len())
        .sum();
    assert_eq!(total, 25);
}

#[tokio::test]
async fn dashboard_combines_services_incidents_and_maintenance() {
    let app = setup_app();
    app.send(
        "POST",
        "/v1/incidents",
        Some(json!({
            "title": "Partial outage",
            "services": [{"name": "chat", "status": "Partial-outage", "regions": ["us-1"]}]
        })),
    )
    .await;

    let (status, dashboard) = app.get("/v1/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["most_critical_status"], "Partial-outage");
    assert_eq!(dashboard["services"].as_array().unwrap().len(), 2);
    assert_eq!(dashboard["services"][0]["name"], "chat");
    assert_eq!(
        dashboard["services"][0]["regions"].as_array().unwrap().len(),
        2
    );
    let days = dashboard["incidents"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["entries"][0]["title"], "Partial outage");
    assert_eq!(dashboard["scheduled_maintenance"]["count"], 0);
}
