//! Domain module
//!
//! Core domain types and business logic: the immutable `Event` fact, its
//! two fan-out projections (`FeedItem`, `Notification`), the idempotency
//! ledger, and the bounded text newtypes that keep bad input out of storage.

pub mod clock;
pub mod context;
pub mod error;
pub mod event;
pub mod feed_item;
pub mod idempotency_key;
pub mod notification;
pub mod text;

pub use clock::{Clock, SystemClock};
pub use context::RequestContext;
pub use error::DomainError;
pub use event::Event;
pub use feed_item::FeedItem;
pub use idempotency_key::IDEMPOTENCY_KEY_MAX_LEN;
pub use notification::Notification;
pub use text::{ObjectId, ObjectType, Verb};
