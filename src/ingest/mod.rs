//! Ingest module
//!
//! Idempotent event ingest with fan-out (spec.md §4.1).

pub mod command;
pub mod coordinator;

pub use command::IngestCommand;
pub use coordinator::{IngestCoordinator, IngestError, IngestResult};
