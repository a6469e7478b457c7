//! Feed Reader
//!
//! Keyset-paginated query against FeedItem joined to Event (spec.md §4.2).
//! Grounded on the teacher's read-model query service
//! (`lactam6-financeATP/src/projection/service.rs`), collapsed to a single
//! read method since there is no projection to maintain here.

use crate::cursor::FeedCursor;
use crate::domain::{DomainError, Event};
use crate::store::{Store, StoreError};

pub struct FeedPage {
    pub items: Vec<Event>,
    pub next_cursor: Option<String>,
}

#[derive(Clone)]
pub struct FeedReader {
    store: Store,
}

impl FeedReader {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn read(
        &self,
        user_id: i64,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<FeedPage, FeedReadError> {
        let decoded = match cursor {
            Some(raw) if !raw.is_empty() => Some(FeedCursor::decode(raw)?),
            _ => None,
        };

        let rows = self
            .store
            .query_feed(
                user_id,
                decoded.map(|c| (c.created_at, c.feed_item_id)),
                limit,
            )
            .await?;

        let next_cursor = if rows.len() == limit as usize {
            rows.last()
                .map(|(feed_item, _)| FeedCursor::new(feed_item.created_at, feed_item.id).encode())
        } else {
            None
        };

        let items = rows.into_iter().map(|(_, event)| event).collect();

        Ok(FeedPage { items, next_cursor })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedReadError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
