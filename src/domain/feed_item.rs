//! Feed Item
//!
//! A fan-out row: one `Event` delivered to one recipient's feed. Created
//! once per (event, user) pair at ingest time and never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub created_at: DateTime<Utc>,
}
