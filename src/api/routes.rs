//! API Routes
//!
//! HTTP endpoint definitions (spec.md §6). DTO field names mirror
//! `EventOutSerializer`/`NotificationOutSerializer`
//! (`original_source/activity/serializers.py`).

use axum::{
    extract::{Extension, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{Dimension, Window};
use crate::domain::{Event, Notification, RequestContext};
use crate::error::AppError;
use crate::ingest::IngestCommand;
use crate::sse::SseConfig;

use super::state::AppState;

// =========================================================================
// Wire types
// =========================================================================

#[derive(Debug, Serialize)]
pub struct EventOut {
    pub event_id: i64,
    pub actor_id: i64,
    pub verb: String,
    pub object_type: String,
    pub object_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Event> for EventOut {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            actor_id: event.actor_id,
            verb: event.verb.as_str().to_string(),
            object_type: event.object_type.as_str().to_string(),
            object_id: event.object_id.as_str().to_string(),
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationOut {
    pub notification_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub event: EventOut,
}

impl From<(Notification, Event)> for NotificationOut {
    fn from((notification, event): (Notification, Event)) -> Self {
        Self {
            notification_id: notification.id,
            user_id: notification.user_id,
            created_at: notification.created_at,
            read_at: notification.read_at,
            delivered_at: notification.delivered_at,
            event: EventOut::from(&event),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IngestEventRequest {
    pub actor_id: i64,
    pub verb: String,
    pub object_type: String,
    pub object_id: String,
    #[serde(default)]
    pub target_user_ids: Vec<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct IngestEventResponse {
    pub event_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub items: Vec<EventOut>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub user_id: Option<i64>,
    pub since: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub items: Vec<NotificationOut>,
    pub next_since: i64,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub window: String,
    pub by: String,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopResponse {
    pub items: Vec<(String, i64)>,
}

fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}

/// A query-string `user_id` must match the asserted header identity
/// (spec.md §4.2-§4.5, mirroring `user_id != header_user_id` in
/// `original_source/activity/views.py`). Absent, it defaults to the header.
fn resolve_user_id(ctx: &RequestContext, requested: Option<i64>) -> Result<i64, AppError> {
    match requested {
        Some(user_id) if user_id != ctx.asserted_user_id => Err(AppError::Forbidden),
        Some(user_id) => Ok(user_id),
        None => Ok(ctx.asserted_user_id),
    }
}

// =========================================================================
// Router
// =========================================================================

/// Routes that require the asserted `X-User-Id` identity.
pub fn authenticated_router() -> Router<AppState> {
    Router::new()
        .route("/events", post(ingest_event))
        .route("/feed", get(get_feed))
        .route("/notifications", get(get_notifications))
        .route("/notifications/stream", get(stream_notifications))
}

/// Routes with no identity requirement (spec.md §6: `/api/top` has no header
/// column).
pub fn public_router() -> Router<AppState> {
    Router::new().route("/top", get(get_top))
}

// =========================================================================
// POST /api/events
// =========================================================================

async fn ingest_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
    Json(request): Json<IngestEventRequest>,
) -> Result<(StatusCode, Json<IngestEventResponse>), AppError> {
    let idem_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let command = IngestCommand::new(
        request.actor_id,
        request.verb,
        request.object_type,
        request.object_id,
        request.target_user_ids,
        request.created_at,
        idem_key,
        state.clock.now(),
    )?;

    let result = state
        .ingest_coordinator
        .ingest(command, ctx.asserted_user_id)
        .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(IngestEventResponse {
            event_id: result.event_id,
        }),
    ))
}

// =========================================================================
// GET /api/feed
// =========================================================================

async fn get_feed(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let user_id = resolve_user_id(&ctx, query.user_id)?;
    let limit = clamp_limit(
        query.limit,
        state.config.feed_default_limit,
        state.config.feed_max_limit,
    );

    let cursor = query.cursor.as_deref().filter(|c| !c.is_empty());
    let page = state.feed_reader.read(user_id, cursor, limit).await?;

    Ok(Json(FeedResponse {
        items: page.items.iter().map(EventOut::from).collect(),
        next_cursor: page.next_cursor,
    }))
}

// =========================================================================
// GET /api/notifications
// =========================================================================

async fn get_notifications(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<NotificationsResponse>, AppError> {
    let user_id = resolve_user_id(&ctx, query.user_id)?;
    let since = query.since.unwrap_or(0);
    let limit = clamp_limit(
        query.limit,
        state.config.notifications_default_limit,
        state.config.notifications_max_limit,
    );

    let page = state
        .notification_reader
        .read(user_id, since, limit)
        .await?;

    Ok(Json(NotificationsResponse {
        items: page.items.into_iter().map(NotificationOut::from).collect(),
        next_since: page.next_since,
    }))
}

// =========================================================================
// GET /api/notifications/stream
// =========================================================================

async fn stream_notifications(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
    Query(query): Query<StreamQuery>,
) -> Result<Response, AppError> {
    let user_id = resolve_user_id(&ctx, query.user_id)?;

    let last_event_id = headers
        .get("Last-Event-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);

    let sse_config = SseConfig {
        queue_capacity: state.config.sse_queue_capacity,
        keepalive_seconds: state.config.sse_keepalive_seconds,
        backfill_limit: state.config.sse_backfill_limit,
    };

    let sse: Sse<_> = crate::sse::stream(
        state.notification_reader.clone(),
        state.broker.clone(),
        user_id,
        last_event_id,
        sse_config,
    );

    // Defeats proxy response buffering so events reach the client as they're
    // produced (`original_source/activity/views.py`: `resp["X-Accel-Buffering"] = "no"`).
    let mut response = sse.into_response();
    response
        .headers_mut()
        .insert("x-accel-buffering", HeaderValue::from_static("no"));
    Ok(response)
}

// =========================================================================
// GET /api/top
// =========================================================================

async fn get_top(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopResponse>, AppError> {
    let window = Window::parse(&query.window).map_err(|_| AppError::NotFound {
        field: "window",
        value: query.window.clone(),
    })?;
    let dimension = Dimension::parse(&query.by).map_err(|_| AppError::NotFound {
        field: "by",
        value: query.by.clone(),
    })?;
    // spec.md §4.7 / `original_source/activity/analytics.py` `top(k=100)`.
    let k = query.k.unwrap_or(100).max(1);

    let items = state
        .analytics
        .top(window, dimension, k, state.clock.now().timestamp());

    Ok(Json(TopResponse { items }))
}
