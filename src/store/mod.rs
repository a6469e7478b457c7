//! Store
//!
//! Transactional persistence over Event, FeedItem, Notification and
//! IdempotencyKey (spec.md §2, §3). Grounded on the teacher's
//! `event_store`/`idempotency` modules, collapsed into a single adapter
//! since this domain has no aggregates to replay.

pub mod error;
pub mod postgres;

pub use error::StoreError;
pub use postgres::{IdempotencyOutcome, Store};
