//! Ingest Coordinator
//!
//! Orchestrates idempotency check, event+fan-out write, and post-commit
//! broker publish (spec.md §4.1). Handler shape grounded on
//! `lactam6-financeATP/src/handlers/transfer_handler.rs`.

use std::sync::Arc;

use crate::analytics::AnalyticsRegistry;
use crate::broker::{NotificationBroker, NotificationMessage};
use crate::domain::DomainError;
use crate::store::{IdempotencyOutcome, Store, StoreError};

use super::command::IngestCommand;

#[derive(Debug, Clone, PartialEq)]
pub struct IngestResult {
    pub event_id: i64,
    pub created: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// `actor_id` in the request body doesn't match the asserted caller
    /// identity — a 400-class actor spoof, distinct from the 403 used by
    /// read handlers for the analogous mismatch (spec.md §7).
    #[error("actor_id must match the asserted caller identity")]
    ActorMismatch,
    #[error(transparent)]
    InvalidArgument(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct IngestCoordinator {
    store: Store,
    analytics: Arc<AnalyticsRegistry>,
    broker: Arc<NotificationBroker>,
}

impl IngestCoordinator {
    pub fn new(
        store: Store,
        analytics: Arc<AnalyticsRegistry>,
        broker: Arc<NotificationBroker>,
    ) -> Self {
        Self {
            store,
            analytics,
            broker,
        }
    }

    pub async fn ingest(
        &self,
        command: IngestCommand,
        asserted_user_id: i64,
    ) -> Result<IngestResult, IngestError> {
        if command.actor_id != asserted_user_id {
            return Err(IngestError::ActorMismatch);
        }

        let mut tx = self.store.begin().await?;

        let mut key_row_id = None;
        if let Some(key) = &command.idem_key {
            match self.store.reserve_idempotency_key(&mut tx, key).await? {
                IdempotencyOutcome::AlreadyBound { event_id } => {
                    tx.commit().await?;
                    return Ok(IngestResult {
                        event_id,
                        created: false,
                    });
                }
                IdempotencyOutcome::Reserved { key_row_id: id }
                | IdempotencyOutcome::ReservedUnbound { key_row_id: id } => {
                    key_row_id = Some(id);
                }
            }
        }

        let event = self
            .store
            .insert_event(
                &mut tx,
                command.actor_id,
                &command.verb,
                &command.object_type,
                &command.object_id,
                command.created_at,
            )
            .await?;

        let mut notified_targets = Vec::new();
        if !command.target_user_ids.is_empty() {
            self.store
                .bulk_insert_feed_items(
                    &mut tx,
                    event.id,
                    &command.target_user_ids,
                    command.created_at,
                )
                .await?;

            notified_targets = self
                .store
                .bulk_insert_notifications(
                    &mut tx,
                    event.id,
                    &command.target_user_ids,
                    command.created_at,
                )
                .await?;
        }

        if let Some(key_row_id) = key_row_id {
            self.store
                .bind_idempotency_key(&mut tx, key_row_id, event.id)
                .await?;
        }

        tx.commit().await?;

        self.analytics.record(
            command.object_id.as_str(),
            command.verb.as_str(),
            command.created_at.timestamp(),
        );

        self.publish_fanout(&event, notified_targets);

        Ok(IngestResult {
            event_id: event.id,
            created: true,
        })
    }

    /// Post-commit publish (spec.md §4.1 step 7): only for notifications
    /// actually inserted in this call, and only if somebody is listening.
    fn publish_fanout(&self, event: &crate::domain::Event, targets: Vec<(i64, i64)>) {
        if targets.is_empty() {
            return;
        }
        let user_ids: Vec<i64> = targets.iter().map(|(uid, _)| *uid).collect();
        if !self.broker.any_subscribers(&user_ids) {
            return;
        }

        for (user_id, notification_id) in targets {
            self.broker.publish(
                user_id,
                NotificationMessage {
                    notification_id,
                    user_id,
                    created_at: event.created_at,
                    read_at: None,
                    delivered_at: None,
                    event: event.clone(),
                },
            );
        }
    }
}
