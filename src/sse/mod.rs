//! SSE Streamer
//!
//! Per-connection backfill-then-live-drain stream (spec.md §4.5). Sequencing
//! is grounded on `NotificationsStreamView.get`
//! (`original_source/activity/views.py`); the Rust generator idiom
//! (`async_stream::stream!`, `axum::response::sse::{Event, Sse}`) is
//! grounded on
//! `other_examples/b791c55d_VannaDii-RustyGPT__rustygpt-server-src-handlers-streaming.rs.rs`.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, Sse};
use futures_core::Stream;

use crate::broker::{NotificationBroker, NotificationMessage};
use crate::notifications::reader::NotificationReader;
use crate::store::StoreError;

pub const KEEPALIVE_SECONDS: u64 = 15;
pub const BACKFILL_LIMIT: i64 = 200;
pub const RETRY_MS: u64 = 3000;

fn to_sse_event(msg: &NotificationMessage) -> Result<SseEvent, Infallible> {
    let data = serde_json::to_string(msg).unwrap_or_else(|_| "{}".to_string());
    Ok(SseEvent::default()
        .id(msg.notification_id.to_string())
        .event("notification")
        .data(data))
}

/// Build the SSE response body for one connection: retry hint, backfill,
/// then a live drain of the broker queue with 15s keep-alive comments.
pub struct SseConfig {
    pub queue_capacity: usize,
    pub keepalive_seconds: u64,
    pub backfill_limit: i64,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            queue_capacity: crate::broker::DEFAULT_QUEUE_CAPACITY,
            keepalive_seconds: KEEPALIVE_SECONDS,
            backfill_limit: BACKFILL_LIMIT,
        }
    }
}

pub fn stream(
    reader: NotificationReader,
    broker: std::sync::Arc<NotificationBroker>,
    user_id: i64,
    last_event_id: i64,
    config: SseConfig,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let handle = broker.subscribe(user_id, config.queue_capacity);

    let body = async_stream::stream! {
        yield Ok(SseEvent::default().retry(Duration::from_millis(RETRY_MS)));

        if last_event_id > 0 {
            match backfill(&reader, user_id, last_event_id, config.backfill_limit).await {
                Ok(messages) => {
                    for msg in &messages {
                        yield to_sse_event(msg);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "sse backfill failed");
                }
            }
        }

        loop {
            match tokio::time::timeout(Duration::from_secs(config.keepalive_seconds), handle.recv()).await {
                Ok(msg) => yield to_sse_event(&msg),
                Err(_elapsed) => yield Ok(SseEvent::default().comment("keep-alive")),
            }
        }
    };

    Sse::new(body)
}

async fn backfill(
    reader: &NotificationReader,
    user_id: i64,
    last_event_id: i64,
    backfill_limit: i64,
) -> Result<Vec<NotificationMessage>, StoreError> {
    let page = reader
        .read(user_id, last_event_id, backfill_limit)
        .await?;
    Ok(page
        .items
        .into_iter()
        .map(|(notification, event)| NotificationMessage {
            notification_id: notification.id,
            user_id: notification.user_id,
            created_at: notification.created_at,
            read_at: notification.read_at,
            delivered_at: notification.delivered_at,
            event,
        })
        .collect())
}
