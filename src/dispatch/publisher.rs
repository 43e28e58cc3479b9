//! Broker publisher with an at-least-once producer contract.
//!
//! The publisher is constructed once at startup and injected into the
//! orchestration layer as a shared capability; it is never re-created
//! per request. [`RedisPublisher`] rides on `redis::aio::ConnectionManager`,
//! which is cheaply cloneable and safe for concurrent use by many
//! simultaneous requests, so the pipeline adds no locking of its own.
//!
//! A topic is a Redis list: LPUSH returns only after the server has
//! accepted the element, which gives the producer-side at-least-once
//! guarantee — a successful `produce` means the broker holds the message
//! for subscribers, and a failed one is surfaced to the caller rather
//! than dropped silently.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

/// Default topic grading workers subscribe to.
pub const DISPATCH_TOPIC: &str = "problem:dispatch";

/// Errors that can occur while publishing to the broker.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Failed to connect to the broker.
    #[error("Broker connection failed: {0}")]
    ConnectionFailed(String),

    /// The broker rejected the publish or became unreachable.
    #[error("Publish failed: {0}")]
    PublishFailed(#[from] redis::RedisError),
}

/// Producer contract for topic publishing.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes an encoded message to a named topic.
    ///
    /// Success guarantees the broker accepted the message for eventual
    /// delivery; failure guarantees the caller is told.
    async fn produce(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Redis-backed topic publisher.
pub struct RedisPublisher {
    redis: ConnectionManager,
}

impl RedisPublisher {
    /// Connects to Redis and creates a new publisher.
    pub async fn connect(redis_url: &str) -> Result<Self, PublishError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| PublishError::ConnectionFailed(e.to_string()))?;

        let redis = ConnectionManager::new(client)
            .await
            .map_err(|e| PublishError::ConnectionFailed(e.to_string()))?;

        Ok(Self { redis })
    }

    /// Creates a publisher from an existing connection manager.
    ///
    /// Useful when sharing a connection pool across components.
    pub fn from_connection(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl Publisher for RedisPublisher {
    async fn produce(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let mut conn = self.redis.clone();
        conn.lpush::<_, _, ()>(topic, payload).await?;

        tracing::debug!(topic, bytes = payload.len(), "published dispatch message");
        Ok(())
    }
}
