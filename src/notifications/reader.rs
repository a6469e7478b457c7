//! Notification Reader
//!
//! Id-based incremental query against Notification joined to Event
//! (spec.md §4.3). Grounded on the teacher's read-model query service
//! (`lactam6-financeATP/src/projection/service.rs`).

use crate::domain::{Event, Notification};
use crate::store::{Store, StoreError};

pub struct NotificationPage {
    pub items: Vec<(Notification, Event)>,
    pub next_since: i64,
}

#[derive(Clone)]
pub struct NotificationReader {
    store: Store,
}

impl NotificationReader {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn read(
        &self,
        user_id: i64,
        since: i64,
        limit: i64,
    ) -> Result<NotificationPage, StoreError> {
        let items = self.store.query_notifications(user_id, since, limit).await?;
        let next_since = items.last().map(|(n, _)| n.id).unwrap_or(since);
        Ok(NotificationPage { items, next_since })
    }
}
