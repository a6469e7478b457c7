//! Ingest Command
//!
//! Validated input to the Ingest Coordinator (spec.md §4.1 step 1). Grounded
//! on the teacher's command structs (`lactam6-financeATP/src/handlers/commands.rs`)
//! — explicit constructor-time validation rather than runtime schema
//! reflection (spec.md §9).

use chrono::{DateTime, Utc};

use crate::domain::{DomainError, ObjectId, ObjectType, Verb};

pub const IDEMPOTENCY_KEY_MAX_LEN: usize = crate::domain::IDEMPOTENCY_KEY_MAX_LEN;

#[derive(Debug, Clone)]
pub struct IngestCommand {
    pub actor_id: i64,
    pub verb: Verb,
    pub object_type: ObjectType,
    pub object_id: ObjectId,
    pub target_user_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub idem_key: Option<String>,
}

impl IngestCommand {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        actor_id: i64,
        verb: impl Into<String>,
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        target_user_ids: Vec<i64>,
        created_at: Option<DateTime<Utc>>,
        idem_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if actor_id <= 0 {
            return Err(DomainError::NotPositive { field: "actor_id" });
        }

        for &uid in &target_user_ids {
            if uid <= 0 {
                return Err(DomainError::NotPositive {
                    field: "target_user_ids",
                });
            }
        }

        if let Some(key) = &idem_key {
            if key.len() > IDEMPOTENCY_KEY_MAX_LEN {
                return Err(DomainError::TooLong {
                    field: "idem_key",
                    max: IDEMPOTENCY_KEY_MAX_LEN,
                    actual: key.len(),
                });
            }
            if key.is_empty() {
                return Err(DomainError::Empty { field: "idem_key" });
            }
        }

        // Stable de-duplication preserving first-occurrence order.
        let mut seen = std::collections::HashSet::with_capacity(target_user_ids.len());
        let target_user_ids = target_user_ids
            .into_iter()
            .filter(|uid| seen.insert(*uid))
            .collect();

        Ok(Self {
            actor_id,
            verb: Verb::new(verb)?,
            object_type: ObjectType::new(object_type)?,
            object_id: ObjectId::new(object_id)?,
            target_user_ids,
            created_at: created_at.unwrap_or(now),
            idem_key,
        })
    }
}
