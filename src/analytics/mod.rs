//! Analytics Registry
//!
//! Fixed set of six counters: `{object_id, verb} × {1m, 5m, 1h}`, `B = 5s`
//! (spec.md §4.7). Ported from `ActivityAnalytics`
//! (`original_source/activity/analytics.py`).

pub mod sliding_window;

use crate::domain::DomainError;
use sliding_window::SlidingWindowCounter;

pub const BUCKET_SECONDS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    OneMinute,
    FiveMinutes,
    OneHour,
}

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::OneMinute => "1m",
            Window::FiveMinutes => "5m",
            Window::OneHour => "1h",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "1m" => Ok(Window::OneMinute),
            "5m" => Ok(Window::FiveMinutes),
            "1h" => Ok(Window::OneHour),
            other => Err(DomainError::UnknownWindow(other.to_string())),
        }
    }

    fn seconds(&self) -> i64 {
        match self {
            Window::OneMinute => 60,
            Window::FiveMinutes => 300,
            Window::OneHour => 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    ObjectId,
    Verb,
}

impl Dimension {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "object_id" => Ok(Dimension::ObjectId),
            "verb" => Ok(Dimension::Verb),
            other => Err(DomainError::UnknownDimension(other.to_string())),
        }
    }
}

struct WindowSet {
    one_minute: SlidingWindowCounter,
    five_minutes: SlidingWindowCounter,
    one_hour: SlidingWindowCounter,
}

impl WindowSet {
    fn new(bucket_seconds: i64) -> Self {
        Self {
            one_minute: SlidingWindowCounter::new(Window::OneMinute.seconds(), bucket_seconds),
            five_minutes: SlidingWindowCounter::new(Window::FiveMinutes.seconds(), bucket_seconds),
            one_hour: SlidingWindowCounter::new(Window::OneHour.seconds(), bucket_seconds),
        }
    }

    fn add(&self, key: &str, ts: i64) {
        self.one_minute.add(key, ts, 1);
        self.five_minutes.add(key, ts, 1);
        self.one_hour.add(key, ts, 1);
    }

    fn counter(&self, window: Window) -> &SlidingWindowCounter {
        match window {
            Window::OneMinute => &self.one_minute,
            Window::FiveMinutes => &self.five_minutes,
            Window::OneHour => &self.one_hour,
        }
    }
}

/// Process-lifetime singleton holding the six sliding-window counters.
/// Created once at startup and shared via application state (spec.md §9
/// "global process-wide state").
pub struct AnalyticsRegistry {
    by_object_id: WindowSet,
    by_verb: WindowSet,
}

impl AnalyticsRegistry {
    /// `bucket_seconds` is the sliding-window bucket width (spec.md §4.7,
    /// `Config::analytics_bucket_seconds`, fixed at 5 by the spec).
    pub fn new(bucket_seconds: i64) -> Self {
        Self {
            by_object_id: WindowSet::new(bucket_seconds),
            by_verb: WindowSet::new(bucket_seconds),
        }
    }

    /// Record one event into all six counters, synchronously in the ingest
    /// path (spec.md §2, §5).
    pub fn record(&self, object_id: &str, verb: &str, ts: i64) {
        self.by_object_id.add(object_id, ts);
        self.by_verb.add(verb, ts);
    }

    pub fn top(&self, window: Window, dimension: Dimension, k: usize, now_ts: i64) -> Vec<(String, i64)> {
        let set = match dimension {
            Dimension::ObjectId => &self.by_object_id,
            Dimension::Verb => &self.by_verb,
        };
        set.counter(window).top(k, now_ts)
    }
}

impl Default for AnalyticsRegistry {
    fn default() -> Self {
        Self::new(BUCKET_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_parse_rejects_unknown() {
        assert!(matches!(
            Window::parse("2m"),
            Err(DomainError::UnknownWindow(_))
        ));
    }

    #[test]
    fn dimension_parse_rejects_unknown() {
        assert!(matches!(
            Dimension::parse("actor_id"),
            Err(DomainError::UnknownDimension(_))
        ));
    }

    #[test]
    fn record_feeds_both_dimensions() {
        let registry = AnalyticsRegistry::new(BUCKET_SECONDS);
        registry.record("doc-1", "like", 100);
        registry.record("doc-1", "like", 100);
        registry.record("doc-2", "share", 100);

        let top_objects = registry.top(Window::OneMinute, Dimension::ObjectId, 10, 100);
        assert_eq!(top_objects[0], ("doc-1".to_string(), 2));

        let top_verbs = registry.top(Window::OneMinute, Dimension::Verb, 10, 100);
        assert_eq!(top_verbs[0], ("like".to_string(), 2));
    }
}
