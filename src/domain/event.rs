//! Event
//!
//! The immutable fact at the center of this service: "actor did verb to
//! object" (spec.md §3). Once stored an `Event` never changes or is deleted.

use super::text::{ObjectId, ObjectType, Verb};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub actor_id: i64,
    pub verb: Verb,
    pub object_type: ObjectType,
    pub object_id: ObjectId,
    pub created_at: DateTime<Utc>,
}
