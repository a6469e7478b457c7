//! Application State
//!
//! Bundles the process-wide singletons (analytics registry, notification
//! broker) with the per-request-cheap service handles (store, readers,
//! coordinator) behind a single `Clone`-able struct, the way the teacher's
//! handlers are constructed fresh from a cloned `PgPool` per request.

use std::sync::Arc;

use sqlx::PgPool;

use crate::analytics::AnalyticsRegistry;
use crate::broker::NotificationBroker;
use crate::config::Config;
use crate::domain::{Clock, SystemClock};
use crate::feed::FeedReader;
use crate::ingest::IngestCoordinator;
use crate::notifications::NotificationReader;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub feed_reader: FeedReader,
    pub notification_reader: NotificationReader,
    pub ingest_coordinator: Arc<IngestCoordinator>,
    pub analytics: Arc<AnalyticsRegistry>,
    pub broker: Arc<NotificationBroker>,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let store = Store::new(pool);
        let analytics = Arc::new(AnalyticsRegistry::new(config.analytics_bucket_seconds));
        let broker = NotificationBroker::new();
        let ingest_coordinator = Arc::new(IngestCoordinator::new(
            store.clone(),
            analytics.clone(),
            broker.clone(),
        ));

        Self {
            feed_reader: FeedReader::new(store.clone()),
            notification_reader: NotificationReader::new(store.clone()),
            store,
            ingest_coordinator,
            analytics,
            broker,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        }
    }
}
