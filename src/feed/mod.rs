//! Feed module
//!
//! Keyset-paginated recipient timeline reads (spec.md §4.2).

pub mod reader;

pub use reader::{FeedPage, FeedReadError, FeedReader};
