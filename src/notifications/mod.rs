//! Notifications module
//!
//! Id-based incremental recipient inbox reads (spec.md §4.3).

pub mod reader;

pub use reader::{NotificationPage, NotificationReader};
