//! Postgres Store
//!
//! Transactional persistence for the four entities (spec.md §2, §3). Mirrors
//! the teacher's `EventStore`/`IdempotencyRepository` shape — a thin struct
//! around a `PgPool`, raw SQL bound by position, `RETURNING id` inserts — but
//! the four tables here are immutable facts and their fan-out, not an
//! event-sourced aggregate store.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::{Event, FeedItem, Notification, ObjectId, ObjectType, Verb};

use super::error::StoreError;

/// Outcome of attempting to reserve an idempotency key inside a savepoint
/// (spec.md §4.1 step 3).
#[derive(Debug, Clone, PartialEq)]
pub enum IdempotencyOutcome {
    /// No row existed; a new one was inserted and is ready to bind.
    Reserved { key_row_id: i64 },
    /// A row already exists and is bound to an Event — short-circuit.
    AlreadyBound { event_id: i64 },
    /// A row already exists but was never bound (prior crash). Continue and
    /// bind it to a freshly inserted Event.
    ReservedUnbound { key_row_id: i64 },
}

#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
        Ok(self.pool.begin().await?)
    }

    /// Reserve `key` inside a nested transaction (Postgres SAVEPOINT via
    /// `tx.begin()` on an already-open transaction). On a UNIQUE violation
    /// the savepoint alone is rolled back, leaving `tx` usable.
    pub async fn reserve_idempotency_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key: &str,
    ) -> Result<IdempotencyOutcome, StoreError> {
        let mut savepoint = tx.begin().await?;

        let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
            "INSERT INTO idempotency_keys (key, created_at) VALUES ($1, now()) RETURNING id",
        )
        .bind(key)
        .fetch_one(&mut *savepoint)
        .await;

        match inserted {
            Ok(key_row_id) => {
                savepoint.commit().await?;
                Ok(IdempotencyOutcome::Reserved { key_row_id })
            }
            Err(err) => {
                let store_err = StoreError::from(err);
                if !store_err.is_unique_violation() {
                    return Err(store_err);
                }
                savepoint.rollback().await?;

                let row = sqlx::query(
                    "SELECT id, event_id FROM idempotency_keys WHERE key = $1 FOR UPDATE",
                )
                .bind(key)
                .fetch_one(&mut **tx)
                .await?;

                let key_row_id: i64 = row.try_get("id")?;
                let event_id: Option<i64> = row.try_get("event_id")?;

                Ok(match event_id {
                    Some(event_id) => IdempotencyOutcome::AlreadyBound { event_id },
                    None => IdempotencyOutcome::ReservedUnbound { key_row_id },
                })
            }
        }
    }

    pub async fn bind_idempotency_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key_row_id: i64,
        event_id: i64,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE idempotency_keys SET event_id = $2 WHERE id = $1")
            .bind(key_row_id)
            .bind(event_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn insert_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        actor_id: i64,
        verb: &Verb,
        object_type: &ObjectType,
        object_id: &ObjectId,
        created_at: DateTime<Utc>,
    ) -> Result<Event, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (actor_id, verb, object_type, object_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(actor_id)
        .bind(verb.as_str())
        .bind(object_type.as_str())
        .bind(object_id.as_str())
        .bind(created_at)
        .fetch_one(&mut **tx)
        .await?;

        Ok(Event {
            id,
            actor_id,
            verb: verb.clone(),
            object_type: object_type.clone(),
            object_id: object_id.clone(),
            created_at,
        })
    }

    /// Insert one FeedItem per target, in order, skipping duplicates of
    /// `(user_id, event_id)`. Returns the `user_id`s actually inserted.
    pub async fn bulk_insert_feed_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_ids: &[i64],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<i64>, StoreError> {
        let mut inserted = Vec::with_capacity(user_ids.len());
        for &user_id in user_ids {
            let row: Option<i64> = sqlx::query_scalar(
                r#"
                INSERT INTO feed_items (user_id, event_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, event_id) DO NOTHING
                RETURNING user_id
                "#,
            )
            .bind(user_id)
            .bind(event_id)
            .bind(created_at)
            .fetch_optional(&mut **tx)
            .await?;

            if row.is_some() {
                inserted.push(user_id);
            }
        }
        Ok(inserted)
    }

    /// Insert one Notification per target. Returns `(user_id, notification_id)`
    /// for the rows actually inserted in this call — exactly the set the
    /// post-commit publish hook needs (spec.md §4.1 step 7).
    pub async fn bulk_insert_notifications(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_ids: &[i64],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<(i64, i64)>, StoreError> {
        let mut inserted = Vec::with_capacity(user_ids.len());
        for &user_id in user_ids {
            let row: Option<i64> = sqlx::query_scalar(
                r#"
                INSERT INTO notifications (user_id, event_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, event_id) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(user_id)
            .bind(event_id)
            .bind(created_at)
            .fetch_optional(&mut **tx)
            .await?;

            if let Some(notification_id) = row {
                inserted.push((user_id, notification_id));
            }
        }
        Ok(inserted)
    }

    /// Keyset-paginated feed query (spec.md §4.2).
    pub async fn query_feed(
        &self,
        user_id: i64,
        cursor: Option<(DateTime<Utc>, i64)>,
        limit: i64,
    ) -> Result<Vec<(FeedItem, Event)>, StoreError> {
        let rows = match cursor {
            Some((created_at, id)) => {
                sqlx::query(
                    r#"
                    SELECT f.id, f.user_id, f.event_id, f.created_at,
                           e.id AS e_id, e.actor_id, e.verb, e.object_type, e.object_id, e.created_at AS e_created_at
                    FROM feed_items f
                    JOIN events e ON e.id = f.event_id
                    WHERE f.user_id = $1
                      AND (f.created_at < $2 OR (f.created_at = $2 AND f.id < $3))
                    ORDER BY f.created_at DESC, f.id DESC
                    LIMIT $4
                    "#,
                )
                .bind(user_id)
                .bind(created_at)
                .bind(id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT f.id, f.user_id, f.event_id, f.created_at,
                           e.id AS e_id, e.actor_id, e.verb, e.object_type, e.object_id, e.created_at AS e_created_at
                    FROM feed_items f
                    JOIN events e ON e.id = f.event_id
                    WHERE f.user_id = $1
                    ORDER BY f.created_at DESC, f.id DESC
                    LIMIT $2
                    "#,
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(row_to_feed_item_and_event).collect()
    }

    /// Incremental since-id notification query (spec.md §4.3).
    pub async fn query_notifications(
        &self,
        user_id: i64,
        since: i64,
        limit: i64,
    ) -> Result<Vec<(Notification, Event)>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.user_id, n.event_id, n.created_at, n.read_at, n.delivered_at,
                   e.id AS e_id, e.actor_id, e.verb, e.object_type, e.object_id, e.created_at AS e_created_at
            FROM notifications n
            JOIN events e ON e.id = n.event_id
            WHERE n.user_id = $1 AND n.id > $2
            ORDER BY n.id ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_notification_and_event)
            .collect()
    }
}

fn row_to_event(row: &sqlx::postgres::PgRow, prefix_id_col: &str) -> Result<Event, StoreError> {
    let id: i64 = row.try_get(prefix_id_col)?;
    let actor_id: i64 = row.try_get("actor_id")?;
    let verb_raw: String = row.try_get("verb")?;
    let object_type_raw: String = row.try_get("object_type")?;
    let object_id_raw: String = row.try_get("object_id")?;
    let created_at: DateTime<Utc> = row.try_get("e_created_at")?;

    Ok(Event {
        id,
        actor_id,
        verb: Verb::new(verb_raw).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        object_type: ObjectType::new(object_type_raw).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        object_id: ObjectId::new(object_id_raw).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at,
    })
}

fn row_to_feed_item_and_event(row: sqlx::postgres::PgRow) -> Result<(FeedItem, Event), StoreError> {
    let event = row_to_event(&row, "e_id")?;
    let feed_item = FeedItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        event_id: row.try_get("event_id")?,
        created_at: row.try_get("created_at")?,
    };
    Ok((feed_item, event))
}

fn row_to_notification_and_event(
    row: sqlx::postgres::PgRow,
) -> Result<(Notification, Event), StoreError> {
    let event = row_to_event(&row, "e_id")?;
    let notification = Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        event_id: row.try_get("event_id")?,
        created_at: row.try_get("created_at")?,
        read_at: row.try_get("read_at")?,
        delivered_at: row.try_get("delivered_at")?,
    };
    Ok((notification, event))
}
