//! Outbound event publishing over NATS

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::retry::RetryPolicy;
use async_nats::{Client, HeaderMap};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Header carrying the publish key; JetStream also uses it for dedup
pub const KEY_HEADER: &str = "Nats-Msg-Id";

/// Transport that delivers one serialized event to a channel
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, channel: &str, key: &str, payload: Vec<u8>) -> AnalyzerResult<()>;
}

/// [`EventBus`] over a NATS client
#[derive(Clone)]
pub struct NatsEventBus {
    client: Client,
}

impl NatsEventBus {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    async fn publish(&self, channel: &str, key: &str, payload: Vec<u8>) -> AnalyzerResult<()> {
        let mut headers = HeaderMap::new();
        headers.insert(KEY_HEADER, key);

        self.client
            .publish_with_headers(channel.to_string(), headers, payload.into())
            .await
            .map_err(|e| AnalyzerError::publish(channel, e.to_string()))?;

        // Surface connection problems here instead of losing the buffered message
        self.client
            .flush()
            .await
            .map_err(|e| AnalyzerError::publish(channel, e.to_string()))?;

        Ok(())
    }
}

/// Publisher that emits typed events with retry and exponential backoff
#[derive(Clone)]
pub struct EventPublisher {
    bus: Arc<dyn EventBus>,
    policy: RetryPolicy,
}

impl EventPublisher {
    /// Create a new event publisher
    pub fn new(bus: Arc<dyn EventBus>, policy: RetryPolicy) -> Self {
        Self { bus, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Emit `payload` to `channel` keyed by `key`, retrying per the policy.
    ///
    /// Returns the last transport error once all attempts fail.
    pub async fn emit<T: Serialize + ?Sized>(&self, channel: &str, key: &str, payload: &T) -> AnalyzerResult<()> {
        let bytes = serde_json::to_vec(payload)?;

        debug!(channel = %channel, key = %key, "Publishing event");

        let outcome = self
            .policy
            .run("emit", key, |_| self.bus.publish(channel, key, bytes.clone()))
            .await;

        if let Err(e) = &outcome.result {
            error!(
                channel = %channel,
                key = %key,
                attempts = outcome.attempts,
                error = %e,
                "Failed to publish event"
            );
        }

        outcome.result
    }

    /// Emit a single time without retry
    pub async fn emit_once<T: Serialize + ?Sized>(&self, channel: &str, key: &str, payload: &T) -> AnalyzerResult<()> {
        let bytes = serde_json::to_vec(payload)?;
        self.bus.publish(channel, key, bytes).await
    }
}
