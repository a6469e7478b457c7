//! API integration tests against a real Postgres instance (spec.md §8
//! scenarios S1, S2, S4).

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use activity_relay::api::{self, AppState};
use activity_relay::Config;

mod common;

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        database_max_connections: 5,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        sse_queue_capacity: 200,
        sse_keepalive_seconds: 15,
        sse_backfill_limit: 200,
        feed_default_limit: 50,
        feed_max_limit: 200,
        notifications_default_limit: 100,
        notifications_max_limit: 200,
        analytics_bucket_seconds: 5,
    }
}

async fn build_app() -> Router {
    let pool = common::setup_test_db().await;
    let state = AppState::new(pool, test_config());
    api::create_router().with_state(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn ingest(
    app: &Router,
    actor_id: i64,
    verb: &str,
    object_id: &str,
    targets: &[i64],
    idem_key: Option<&str>,
) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method("POST")
        .uri("/events")
        .header("content-type", "application/json")
        .header("X-User-Id", actor_id.to_string());

    if let Some(key) = idem_key {
        req = req.header("Idempotency-Key", key);
    }

    let req = req
        .body(Body::from(
            json!({
                "actor_id": actor_id,
                "verb": verb,
                "object_type": "doc",
                "object_id": object_id,
                "target_user_ids": targets,
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let json = body_json(response).await;
    (status, json)
}

/// S1: paginating `/api/feed` with repeated `next_cursor` application
/// yields each item exactly once in `(created_at DESC, id DESC)` order.
#[tokio::test]
async fn feed_pagination_yields_each_item_once_in_order() {
    let app = build_app().await;

    for i in 0..5 {
        let (status, _) = ingest(&app, 1, "like", &format!("doc-{i}"), &[42], None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let uri = match &cursor {
            Some(c) => format!("/feed?limit=2&cursor={c}"),
            None => "/feed?limit=2".to_string(),
        };
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header("X-User-Id", "42")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        let items = body["items"].as_array().unwrap().clone();
        for item in &items {
            seen.push(item["object_id"].as_str().unwrap().to_string());
        }

        cursor = body["next_cursor"].as_str().map(|s| s.to_string());
        if cursor.is_none() {
            break;
        }
    }

    assert_eq!(
        seen,
        vec!["doc-4", "doc-3", "doc-2", "doc-1", "doc-0"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

/// S2: `/api/notifications?since=X` never returns `id <= X`; concatenated
/// pages yield ascending ids without duplicates.
#[tokio::test]
async fn notifications_since_excludes_seen_ids_and_advances() {
    let app = build_app().await;

    for i in 0..3 {
        let (status, _) = ingest(&app, 1, "comment", &format!("post-{i}"), &[7], None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let req = Request::builder()
        .method("GET")
        .uri("/notifications?since=0&limit=2")
        .header("X-User-Id", "7")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let first_page = body_json(response).await;
    let first_items = first_page["items"].as_array().unwrap();
    assert_eq!(first_items.len(), 2);
    let next_since = first_page["next_since"].as_i64().unwrap();

    let req = Request::builder()
        .method("GET")
        .uri(format!("/notifications?since={next_since}&limit=2"))
        .header("X-User-Id", "7")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let second_page = body_json(response).await;
    let second_items = second_page["items"].as_array().unwrap();
    assert_eq!(second_items.len(), 1);

    for item in second_items {
        assert!(item["notification_id"].as_i64().unwrap() > next_since);
    }
}

/// S4: replaying the same `Idempotency-Key` returns the original `event_id`
/// without a second fan-out.
#[tokio::test]
async fn idempotent_ingest_replays_same_event_id() {
    let app = build_app().await;

    let (status_1, body_1) = ingest(&app, 1, "like", "doc-1", &[9], Some("key-abc")).await;
    assert_eq!(status_1, StatusCode::CREATED);
    let event_id_1 = body_1["event_id"].as_i64().unwrap();

    let (status_2, body_2) = ingest(&app, 1, "like", "doc-1", &[9], Some("key-abc")).await;
    assert_eq!(status_2, StatusCode::OK);
    assert_eq!(body_2["event_id"].as_i64().unwrap(), event_id_1);

    let req = Request::builder()
        .method("GET")
        .uri("/notifications?since=0&limit=10")
        .header("X-User-Id", "9")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let page = body_json(response).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn ingest_rejects_actor_spoof() {
    let app = build_app().await;
    // actor_id (2) doesn't match the asserted X-User-Id header (1).
    let req = Request::builder()
        .method("POST")
        .uri("/events")
        .header("content-type", "application/json")
        .header("X-User-Id", "1")
        .body(Body::from(
            json!({
                "actor_id": 2,
                "verb": "like",
                "object_type": "doc",
                "object_id": "doc-1",
                "target_user_ids": [],
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_identity_header_is_unauthenticated() {
    let app = build_app().await;
    let req = Request::builder()
        .method("GET")
        .uri("/feed")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn top_endpoint_requires_no_identity_header() {
    let app = build_app().await;
    ingest(&app, 3, "share", "doc-top", &[], None).await;

    let req = Request::builder()
        .method("GET")
        .uri("/top?window=1m&by=verb&k=5")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["items"].as_array().unwrap().len() >= 1);
}
