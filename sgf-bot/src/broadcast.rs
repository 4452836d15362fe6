//! Broadcast to many users
//!
//! Sends one message to a list of recipients, sequentially, pacing the sends
//! with a rate limiter to stay under the transport's limit. A failed delivery
//! is logged and recorded as `false`; it never stops the batch.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use sgf_common::UserId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Per-recipient delivery failure
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Recipient blocked the bot, deleted their account, or is unknown
    #[error("Recipient {0} is unavailable")]
    RecipientUnavailable(UserId),

    /// Transport refused the message
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    /// Network or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Outbound message channel
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    user_id: UserId,
    text: &'a str,
}

/// Delivers messages by POSTing `{user_id, text}` to a webhook
pub struct WebhookTransport {
    client: Client,
    url: String,
}

impl WebhookTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    async fn send(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&OutboundMessage { user_id, text })
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(DeliveryError::RecipientUnavailable(user_id))
            }
            status => Err(DeliveryError::Rejected(format!("HTTP {}", status))),
        }
    }
}

/// Paced sequential fan-out over a [`Transport`]
pub struct Broadcaster {
    transport: Arc<dyn Transport>,
    /// One send per pacing period; `None` when pacing is disabled
    limiter: Option<DefaultDirectRateLimiter>,
}

impl Broadcaster {
    /// # Arguments
    /// * `transport` - Channel used for every send
    /// * `pacing` - Minimum interval between two sends (zero disables pacing)
    pub fn new(transport: Arc<dyn Transport>, pacing: Duration) -> Self {
        let limiter = Quota::with_period(pacing).map(RateLimiter::direct);
        Self { transport, limiter }
    }

    /// Send `message` to every recipient
    ///
    /// Duplicate ids receive the message once.
    ///
    /// # Returns
    /// Map of user id → delivery success
    pub async fn send_all(&self, recipients: &[UserId], message: &str) -> BTreeMap<UserId, bool> {
        let mut results = BTreeMap::new();

        for &user_id in recipients {
            if results.contains_key(&user_id) {
                continue;
            }

            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            let delivered = match self.transport.send(user_id, message).await {
                Ok(()) => true,
                Err(e @ DeliveryError::RecipientUnavailable(_)) => {
                    warn!(user_id, error = %e, "Broadcast not delivered");
                    false
                }
                Err(e) => {
                    error!(user_id, error = %e, "Broadcast send failed");
                    false
                }
            };
            results.insert(user_id, delivered);
        }

        let successful = results.values().filter(|ok| **ok).count();
        info!(
            successful,
            failed = results.len() - successful,
            "Broadcast finished"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Instant;
    use tokio::sync::Mutex;

    /// Records sends; fails for the configured ids
    #[derive(Default)]
    struct FakeTransport {
        failing: HashSet<UserId>,
        sent: Mutex<Vec<UserId>>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, user_id: UserId, _text: &str) -> Result<(), DeliveryError> {
            self.sent.lock().await.push(user_id);
            if self.failing.contains(&user_id) {
                return Err(DeliveryError::Transport("connection reset".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_batch() {
        let transport = Arc::new(FakeTransport {
            failing: HashSet::from([2]),
            ..Default::default()
        });
        let broadcaster = Broadcaster::new(transport.clone(), Duration::ZERO);

        let results = broadcaster.send_all(&[1, 2, 3], "Maintenance tonight").await;

        assert_eq!(results, BTreeMap::from([(1, true), (2, false), (3, true)]));
        assert_eq!(*transport.sent.lock().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_duplicates_are_sent_once() {
        let transport = Arc::new(FakeTransport::default());
        let broadcaster = Broadcaster::new(transport.clone(), Duration::ZERO);

        let results = broadcaster.send_all(&[5, 5, 6, 5], "hi").await;

        assert_eq!(results.len(), 2);
        assert_eq!(*transport.sent.lock().await, vec![5, 6]);
    }

    #[tokio::test]
    async fn test_sends_are_paced() {
        let transport = Arc::new(FakeTransport::default());
        let broadcaster = Broadcaster::new(transport, Duration::from_millis(20));

        let start = Instant::now();
        broadcaster.send_all(&[1, 2, 3], "hi").await;

        // First send is immediate, the next two wait one period each
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_empty_recipient_list() {
        let broadcaster = Broadcaster::new(Arc::new(FakeTransport::default()), Duration::ZERO);
        assert!(broadcaster.send_all(&[], "hi").await.is_empty());
    }
}
