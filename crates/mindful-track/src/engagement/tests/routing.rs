use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::engagement::router::{engagement_router, score_handler, ScoreRequest};
use crate::engagement::service::{EngagementService, ServiceSettings};

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn score_handler_returns_weighted_score() {
    let (service, _store) = build_service();

    let response = score_handler(
        State(Arc::new(service)),
        axum::Json(ScoreRequest {
            attendance: 92.0,
            participation: 85.0,
            resources: 78.0,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_close(body["engagement_score"].as_f64().expect("number"), 85.7);
    assert_eq!(body["weights"]["participation"], json!(0.4));
}

#[tokio::test]
async fn score_endpoint_rejects_negative_input() {
    let (service, _store) = build_service();
    let app = engagement_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/scores",
            json!({ "attendance": -1.0, "participation": 10.0, "resources": 10.0 }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("attendance"));
}

#[tokio::test]
async fn engagement_flow_over_http() {
    let (service, _store) = build_service();
    let app = engagement_router(Arc::new(service));

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/events",
            serde_json::to_value(event_draft()).expect("draft serializes"),
        ))
        .await
        .expect("router responds");
    assert_eq!(created.status(), StatusCode::CREATED);
    let event = read_json_body(created).await;
    let event_id = event["id"].as_str().expect("event id").to_string();

    let joined = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/events/{event_id}/participants"),
            json!({ "user_id": "user-ada" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(joined.status(), StatusCode::CREATED);
    let participant = read_json_body(joined).await;
    let participant_id = participant["participant_id"]
        .as_str()
        .expect("participant id")
        .to_string();

    let logged = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/engagement",
            json!({
                "participant_id": participant_id,
                "session_id": "session-keynote",
                "activity_type": "feedback",
                "metadata": { "rating": 5, "comment": "inspiring" }
            }),
        ))
        .await
        .expect("router responds");
    assert_eq!(logged.status(), StatusCode::CREATED);
    let row = read_json_body(logged).await;
    assert_eq!(row["points"], json!(15));
    assert_eq!(row["activity_type"], json!("feedback"));
    assert_eq!(row["metadata"]["comment"], json!("inspiring"));

    let refreshed = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/participants/{participant_id}/refresh"),
            json!({}),
        ))
        .await
        .expect("router responds");
    assert_eq!(refreshed.status(), StatusCode::OK);
    let view = read_json_body(refreshed).await;
    assert_close(view["participation_score"].as_f64().expect("number"), 10.0);
    assert_close(view["engagement_score"].as_f64().expect("number"), 4.0);

    let board = app
        .clone()
        .oneshot(get_request(&format!("/api/v1/events/{event_id}/leaderboard")))
        .await
        .expect("router responds");
    assert_eq!(board.status(), StatusCode::OK);
    let entries = read_json_body(board).await;
    assert_eq!(entries.as_array().expect("array").len(), 1);

    let activity = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/participants/{participant_id}/activity"
        )))
        .await
        .expect("router responds");
    assert_eq!(activity.status(), StatusCode::OK);
    let rows = read_json_body(activity).await;
    assert_eq!(rows.as_array().expect("array").len(), 1);
    assert_eq!(rows[0]["metadata"]["rating"], json!(5));

    let recent = app
        .clone()
        .oneshot(get_request("/api/v1/engagement/recent?limit=5"))
        .await
        .expect("router responds");
    assert_eq!(recent.status(), StatusCode::OK);
    let feed = read_json_body(recent).await;
    assert_eq!(feed.as_array().expect("array").len(), 1);
    assert_eq!(feed[0]["user_id"], json!("user-ada"));
    assert_eq!(feed[0]["activity_type"], json!("feedback"));
    assert_eq!(feed[0]["participant_id"], json!(participant_id));

    let unknown = app
        .oneshot(get_request("/api/v1/participants/ptc-ghost/activity"))
        .await
        .expect("router responds");
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_participant_maps_to_not_found() {
    let (service, _store) = build_service();
    let app = engagement_router(Arc::new(service));

    let response = app
        .oneshot(get_request("/api/v1/participants/ptc-missing"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_join_maps_to_conflict() {
    let (service, _store, event, _participant) = seeded_service();
    let app = engagement_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/events/{}/participants", event.id),
            json!({ "user_id": "user-ada" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn storage_outage_maps_to_service_unavailable() {
    let service = EngagementService::new(
        Arc::new(UnavailableStore::new()),
        ServiceSettings::default(),
    );
    let app = engagement_router(Arc::new(service));

    let response = app
        .oneshot(get_request("/api/v1/engagement/recent"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("database offline"));
}

#[tokio::test]
async fn clone_and_delete_event_over_http() {
    let (service, _store, event, _participant) = seeded_service();
    let app = engagement_router(Arc::new(service));

    let cloned = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/events/{}/clone", event.id),
            json!({}),
        ))
        .await
        .expect("router responds");
    assert_eq!(cloned.status(), StatusCode::CREATED);
    let copy = read_json_body(cloned).await;
    assert_eq!(copy["name"], json!(event.name));
    assert_ne!(copy["id"], json!(event.id.0));

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/events/{}", event.id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(deleted.status(), StatusCode::OK);
    let summary = read_json_body(deleted).await;
    assert_eq!(summary["participants"], json!(1));

    let gone = app
        .oneshot(get_request(&format!("/api/v1/events/{}", event.id)))
        .await
        .expect("router responds");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
