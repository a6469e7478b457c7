//! Notification Broker
//!
//! In-process pub/sub keyed by recipient id (spec.md §4.4). Grounded on
//! `NotificationBroker` (`original_source/activity/sse.py`) for the
//! drop-oldest-then-push policy and the registry-lock-then-release-before-delivery
//! discipline; the Rust concurrency idiom (`Mutex<HashMap<_, Vec<Arc<_>>>>`
//! registry, per-subscriber bounded queue) is grounded on
//! `other_examples/b791c55d_VannaDii-RustyGPT__rustygpt-server-src-handlers-streaming.rs.rs`.
//! A bounded `tokio::sync::mpsc` channel can't have its oldest element
//! popped by a producer, so each queue is a `Mutex<VecDeque<_>>` guarded by
//! a `Notify` instead.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::Event;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_QUEUE_CAPACITY: usize = 200;

/// Wire-shape payload delivered to subscribers; mirrors the dict built in
/// `EventIngestView.post._publish_after_commit` in the original source.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationMessage {
    pub notification_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub event: Event,
}

struct Subscriber {
    id: u64,
    cap: usize,
    queue: Mutex<VecDeque<NotificationMessage>>,
    notify: tokio::sync::Notify,
}

/// Handle returned by `subscribe`. Dropping it unsubscribes.
pub struct SubscriptionHandle {
    user_id: i64,
    subscriber: Arc<Subscriber>,
    broker: Arc<NotificationBroker>,
}

impl SubscriptionHandle {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Await the next message for this subscription. Never returns `None`;
    /// callers layer their own timeout (spec.md §4.5 step 5).
    pub async fn recv(&self) -> NotificationMessage {
        loop {
            let notified = self.subscriber.notify.notified();
            if let Some(msg) = self.subscriber.queue.lock().unwrap().pop_front() {
                return msg;
            }
            notified.await;
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.broker.unsubscribe(self.user_id, self.subscriber.id);
    }
}

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
pub struct NotificationBroker {
    registry: Mutex<HashMap<i64, Vec<Arc<Subscriber>>>>,
}

impl NotificationBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(HashMap::new()),
        })
    }

    pub fn subscribe(self: &Arc<Self>, user_id: i64, queue_cap: usize) -> SubscriptionHandle {
        let subscriber = Arc::new(Subscriber {
            id: NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed),
            cap: queue_cap,
            queue: Mutex::new(VecDeque::new()),
            notify: tokio::sync::Notify::new(),
        });

        self.registry
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .push(subscriber.clone());

        SubscriptionHandle {
            user_id,
            subscriber,
            broker: self.clone(),
        }
    }

    fn unsubscribe(&self, user_id: i64, subscriber_id: u64) {
        let mut registry = self.registry.lock().unwrap();
        if let Some(subscribers) = registry.get_mut(&user_id) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                registry.remove(&user_id);
            }
        }
    }

    /// Deliver `message` to every current subscriber of `user_id`. The
    /// registry lock is released before any queue is touched (spec.md §5).
    pub fn publish(&self, user_id: i64, message: NotificationMessage) {
        let subscribers = match self.registry.lock().unwrap().get(&user_id) {
            Some(subs) => subs.clone(),
            None => return,
        };

        for subscriber in subscribers {
            let mut queue = subscriber.queue.lock().unwrap();
            if queue.len() >= subscriber.cap {
                queue.pop_front();
            }
            if queue.len() < subscriber.cap {
                queue.push_back(message.clone());
            }
            drop(queue);
            subscriber.notify.notify_one();
        }
    }

    /// Cheap existence probe to skip database work when nobody is
    /// listening (spec.md §4.1 step 7, `broker.any_subscribers` in the
    /// original source).
    pub fn any_subscribers(&self, user_ids: &[i64]) -> bool {
        let registry = self.registry.lock().unwrap();
        user_ids
            .iter()
            .any(|uid| registry.get(uid).is_some_and(|subs| !subs.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_message(notification_id: i64) -> NotificationMessage {
        let at = Utc.with_ymd_and_hms(2026, 7, 27, 0, 0, 0).unwrap();
        NotificationMessage {
            notification_id,
            user_id: 2,
            created_at: at,
            read_at: None,
            delivered_at: None,
            event: Event {
                id: notification_id,
                actor_id: 1,
                verb: crate::domain::Verb::new("like").unwrap(),
                object_type: crate::domain::ObjectType::new("doc").unwrap(),
                object_id: crate::domain::ObjectId::new("d1").unwrap(),
                created_at: at,
            },
        }
    }

    #[test]
    fn any_subscribers_false_when_empty() {
        let broker = NotificationBroker::new();
        assert!(!broker.any_subscribers(&[1, 2]));
    }

    #[test]
    fn subscribe_registers_and_drop_unsubscribes() {
        let broker = NotificationBroker::new();
        let handle = broker.subscribe(2, DEFAULT_QUEUE_CAPACITY);
        assert!(broker.any_subscribers(&[2]));
        drop(handle);
        assert!(!broker.any_subscribers(&[2]));
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let broker = NotificationBroker::new();
        broker.publish(99, sample_message(1));
    }

    #[tokio::test]
    async fn subscriber_receives_published_message() {
        let broker = NotificationBroker::new();
        let handle = broker.subscribe(2, DEFAULT_QUEUE_CAPACITY);
        broker.publish(2, sample_message(7));
        let msg = handle.recv().await;
        assert_eq!(msg.notification_id, 7);
    }

    #[test]
    fn s6_slow_consumer_drop_oldest_retains_cap() {
        let broker = NotificationBroker::new();
        let handle = broker.subscribe(2, 4);
        for i in 1..=10 {
            broker.publish(2, sample_message(i));
        }
        let remaining = handle.subscriber.queue.lock().unwrap().len();
        assert_eq!(remaining, 4);
        let ids: Vec<i64> = handle
            .subscriber
            .queue
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.notification_id)
            .collect();
        assert_eq!(ids, vec![7, 8, 9, 10]);
    }
}
