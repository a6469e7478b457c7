//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Per-subscriber SSE queue capacity (spec.md §4.4 `Subscribe`, default 200)
    pub sse_queue_capacity: usize,

    /// SSE live-loop keep-alive timeout in seconds (spec.md §4.5, default 15)
    pub sse_keepalive_seconds: u64,

    /// Max notifications replayed on SSE resume (spec.md §4.5, default 200)
    pub sse_backfill_limit: i64,

    /// `/api/feed` default page size (spec.md §4.2, default 50)
    pub feed_default_limit: i64,

    /// `/api/feed` max page size (spec.md §4.2, default 200)
    pub feed_max_limit: i64,

    /// `/api/notifications` default page size (spec.md §4.3, default 100)
    pub notifications_default_limit: i64,

    /// `/api/notifications` max page size (spec.md §4.3, default 200)
    pub notifications_max_limit: i64,

    /// Sliding-window bucket size in seconds (spec.md §4.7, fixed at 5)
    pub analytics_bucket_seconds: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let sse_queue_capacity = env::var("SSE_QUEUE_CAPACITY")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SSE_QUEUE_CAPACITY"))?;

        let sse_keepalive_seconds = env::var("SSE_KEEPALIVE_SECONDS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SSE_KEEPALIVE_SECONDS"))?;

        let sse_backfill_limit = env::var("SSE_BACKFILL_LIMIT")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SSE_BACKFILL_LIMIT"))?;

        let feed_default_limit = env::var("FEED_DEFAULT_LIMIT")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("FEED_DEFAULT_LIMIT"))?;

        let feed_max_limit = env::var("FEED_MAX_LIMIT")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("FEED_MAX_LIMIT"))?;

        let notifications_default_limit = env::var("NOTIFICATIONS_DEFAULT_LIMIT")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("NOTIFICATIONS_DEFAULT_LIMIT"))?;

        let notifications_max_limit = env::var("NOTIFICATIONS_MAX_LIMIT")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("NOTIFICATIONS_MAX_LIMIT"))?;

        let analytics_bucket_seconds = env::var("ANALYTICS_BUCKET_SECONDS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("ANALYTICS_BUCKET_SECONDS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            sse_queue_capacity,
            sse_keepalive_seconds,
            sse_backfill_limit,
            feed_default_limit,
            feed_max_limit,
            notifications_default_limit,
            notifications_max_limit,
            analytics_bucket_seconds,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
