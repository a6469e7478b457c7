//! Sliding-Window Top-K Counter
//!
//! Ring of `M` time buckets with lazy expiry, ported field-for-field from
//! `SlidingWindowTop` (`original_source/activity/analytics.py`). Ties in
//! `top` are broken by first-insertion order, which is why totals are kept
//! in an `IndexMap` rather than a plain `HashMap`.

use indexmap::IndexMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Bucket {
    bucket_id: Option<i64>,
    counts: IndexMap<String, i64>,
}

struct Inner {
    buckets: Vec<Bucket>,
    total: IndexMap<String, i64>,
}

/// Bucketed frequency counter over the last `window_seconds`.
pub struct SlidingWindowCounter {
    bucket_size_seconds: i64,
    num_buckets: i64,
    inner: Mutex<Inner>,
}

impl SlidingWindowCounter {
    pub fn new(window_seconds: i64, bucket_size_seconds: i64) -> Self {
        assert!(window_seconds > 0, "window_seconds must be > 0");
        assert!(bucket_size_seconds > 0, "bucket_size_seconds must be > 0");

        let num_buckets = ((window_seconds + bucket_size_seconds - 1) / bucket_size_seconds).max(1);
        let buckets = (0..num_buckets).map(|_| Bucket::default()).collect();

        Self {
            bucket_size_seconds,
            num_buckets,
            inner: Mutex::new(Inner {
                buckets,
                total: IndexMap::new(),
            }),
        }
    }

    fn current_bucket_id(&self, ts: i64) -> i64 {
        ts.div_euclid(self.bucket_size_seconds)
    }

    /// Drop buckets older than the window relative to `now_ts`, then purge
    /// zero/negative totals left behind.
    fn expire_old(inner: &mut Inner, num_buckets: i64, current_bucket: i64) {
        let min_valid = current_bucket - (num_buckets - 1);
        for bucket in inner.buckets.iter_mut() {
            let Some(bucket_id) = bucket.bucket_id else {
                continue;
            };
            if bucket_id < min_valid {
                for (key, count) in bucket.counts.drain(..) {
                    if let Some(total) = inner.total.get_mut(&key) {
                        *total -= count;
                    }
                }
                bucket.bucket_id = None;
            }
        }
        inner.total.retain(|_, count| *count > 0);
    }

    /// Record `n` occurrences of `key` at `ts` (unix seconds). Empty keys
    /// and non-positive `n` are ignored.
    pub fn add(&self, key: &str, ts: i64, n: i64) {
        if key.is_empty() || n <= 0 {
            return;
        }

        let bucket_id = self.current_bucket_id(ts);
        let idx = bucket_id.rem_euclid(self.num_buckets) as usize;

        let mut inner = self.inner.lock().unwrap();
        Self::expire_old(&mut inner, self.num_buckets, bucket_id);

        if inner.buckets[idx].bucket_id != Some(bucket_id) {
            let old_counts = std::mem::take(&mut inner.buckets[idx].counts);
            for (key, count) in old_counts {
                if let Some(total) = inner.total.get_mut(&key) {
                    *total -= count;
                }
            }
            inner.buckets[idx].bucket_id = Some(bucket_id);
        }

        *inner.buckets[idx].counts.entry(key.to_string()).or_insert(0) += n;
        *inner.total.entry(key.to_string()).or_insert(0) += n;
        inner.total.retain(|_, count| *count > 0);
    }

    /// Top `k` keys by count, descending, ties broken by first-insertion
    /// order.
    pub fn top(&self, k: usize, now_ts: i64) -> Vec<(String, i64)> {
        let current_bucket = self.current_bucket_id(now_ts);
        let mut inner = self.inner.lock().unwrap();
        Self::expire_old(&mut inner, self.num_buckets, current_bucket);

        let mut entries: Vec<(String, i64)> =
            inner.total.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(k);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key_and_nonpositive_n() {
        let counter = SlidingWindowCounter::new(60, 5);
        counter.add("", 100, 1);
        counter.add("a", 100, 0);
        counter.add("a", 100, -1);
        assert_eq!(counter.top(10, 100), Vec::<(String, i64)>::new());
    }

    #[test]
    fn s3_top_k_scenario() {
        // S3: SlidingWindow(W=60, B=5). Add("a",100); Add("a",101); Add("b",101);
        // Top(now=110) -> [("a", 2), ("b", 1)]
        let counter = SlidingWindowCounter::new(60, 5);
        counter.add("a", 100, 1);
        counter.add("a", 101, 1);
        counter.add("b", 101, 1);

        assert_eq!(
            counter.top(10, 110),
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let counter = SlidingWindowCounter::new(60, 5);
        counter.add("b", 100, 1);
        counter.add("a", 100, 1);
        assert_eq!(
            counter.top(10, 100),
            vec![("b".to_string(), 1), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn expires_after_window_plus_bucket() {
        let counter = SlidingWindowCounter::new(60, 5);
        counter.add("a", 0, 5);
        assert_eq!(counter.top(10, 0), vec![("a".to_string(), 5)]);
        // after W + B seconds the contribution is gone
        assert_eq!(counter.top(10, 65), Vec::<(String, i64)>::new());
    }

    #[test]
    fn ring_slot_reuse_subtracts_old_contribution() {
        let counter = SlidingWindowCounter::new(10, 5);
        // num_buckets = 2; bucket ids cycle every 10s onto the same slot
        counter.add("a", 0, 3);
        counter.add("a", 10, 4);
        // slot 0 (bucket_id 0) reused by bucket_id 2 at ts=10; old count gone
        assert_eq!(counter.top(10, 10), vec![("a".to_string(), 4)]);
    }

    #[test]
    fn top_k_truncates() {
        let counter = SlidingWindowCounter::new(60, 5);
        counter.add("a", 0, 5);
        counter.add("b", 0, 4);
        counter.add("c", 0, 3);
        assert_eq!(
            counter.top(2, 0),
            vec![("a".to_string(), 5), ("b".to_string(), 4)]
        );
    }
}
