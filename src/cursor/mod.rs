//! Feed Cursor Codec
//!
//! Opaque keyset pagination token: URL-safe base64 of a compact JSON
//! `{created_at, feed_item_id}`. Ported from `encode_feed_cursor` /
//! `decode_feed_cursor` (`original_source/activity/cursors.py`). Not
//! authenticated — see spec.md §4.8 and §9 "Cursor authenticity".

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

const ENGINE: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub feed_item_id: i64,
}

#[derive(Serialize, Deserialize)]
struct CursorPayload {
    created_at: DateTime<Utc>,
    feed_item_id: i64,
}

impl FeedCursor {
    pub fn new(created_at: DateTime<Utc>, feed_item_id: i64) -> Self {
        Self {
            created_at,
            feed_item_id,
        }
    }

    /// `URL_SAFE_NO_PAD` already strips padding, matching the Python
    /// implementation's manual `rstrip("=")`.
    pub fn encode(&self) -> String {
        let payload = CursorPayload {
            created_at: self.created_at,
            feed_item_id: self.feed_item_id,
        };
        let raw = serde_json::to_vec(&payload).expect("cursor payload always serializes");
        ENGINE.encode(raw)
    }

    pub fn decode(cursor: &str) -> Result<Self, DomainError> {
        if cursor.is_empty() {
            return Err(DomainError::InvalidCursor);
        }

        let raw = ENGINE
            .decode(cursor.as_bytes())
            .map_err(|_| DomainError::InvalidCursor)?;
        let payload: CursorPayload =
            serde_json::from_slice(&raw).map_err(|_| DomainError::InvalidCursor)?;

        if payload.feed_item_id <= 0 {
            return Err(DomainError::InvalidCursor);
        }

        Ok(Self {
            created_at: payload.created_at,
            feed_item_id: payload.feed_item_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trips() {
        let at = Utc.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap();
        let cursor = FeedCursor::new(at, 42);
        let encoded = cursor.encode();
        let decoded = FeedCursor::decode(&encoded).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn encoded_has_no_padding() {
        let at = Utc.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap();
        let cursor = FeedCursor::new(at, 1);
        assert!(!cursor.encode().contains('='));
    }

    #[test]
    fn rejects_empty_string() {
        assert_eq!(FeedCursor::decode(""), Err(DomainError::InvalidCursor));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            FeedCursor::decode("not-valid-base64!!!"),
            Err(DomainError::InvalidCursor)
        );
    }

    #[test]
    fn rejects_non_positive_feed_item_id() {
        let at = Utc.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap();
        let cursor = FeedCursor::new(at, 0);
        assert_eq!(FeedCursor::decode(&cursor.encode()), Err(DomainError::InvalidCursor));
    }

    #[test]
    fn decodes_unpadded_output_regardless_of_length() {
        let at = Utc.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap();
        let cursor = FeedCursor::new(at, 7);
        let encoded = cursor.encode();
        assert!(FeedCursor::decode(&encoded).is_ok());
    }
}
