//! Idempotency Key
//!
//! Binds a caller-supplied dedup key to (at most) one `Event`. A row with
//! `event_id IS NULL` means a prior ingest reserved the key but crashed
//! before binding it — see spec.md §9 and the Open Question resolution in
//! DESIGN.md. The row itself is never read back as a struct; `Store`
//! reports the reservation outcome directly as `IdempotencyOutcome`.

pub const IDEMPOTENCY_KEY_MAX_LEN: usize = 255;
