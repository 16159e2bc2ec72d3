//! Rate-limit aware wrapper around [`ChatGateway`].

use std::{future::Future, sync::Arc, time::Duration};

use {
    spamguard_common::{ChatId, MessageId},
    tokio::task::JoinHandle,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use spamguard_metrics::{counter, delivery as delivery_metrics, labels};

use crate::{
    control::Control,
    gateway::{ChatGateway, DeliveryError},
};

/// Bounds for retrying after "retry after" rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub max_retries: u32,
    /// Cap on the accumulated wait of one operation.
    pub max_total_wait: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_total_wait: Duration::from_secs(300),
        }
    }
}

/// Executes outbound chat operations, waiting out rate limits.
///
/// Only [`DeliveryError::RateLimited`] is retried, using the server's hint
/// as the wait. Any other error is returned on the first attempt.
#[derive(Clone)]
pub struct DeliveryGuard {
    gateway: Arc<dyn ChatGateway>,
    policy: DeliveryPolicy,
}

impl DeliveryGuard {
    pub fn new(gateway: Arc<dyn ChatGateway>, policy: DeliveryPolicy) -> Self {
        Self { gateway, policy }
    }

    pub async fn send_reliable(
        &self,
        chat_id: ChatId,
        text: &str,
        control: Option<&Control>,
    ) -> Result<MessageId, DeliveryError> {
        self.with_retry("send message", chat_id, || {
            self.gateway.send_text(chat_id, text, control)
        })
        .await
    }

    pub async fn delete_reliable(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        self.with_retry("delete message", chat_id, || {
            self.gateway.delete_message(chat_id, message_id)
        })
        .await
    }

    /// Post `text` and delete it again after `ttl`.
    ///
    /// Runs entirely on a detached task; the caller never waits for it.
    /// Failures are logged under the `spamguard::ephemeral` target. The
    /// handle is only useful to tests.
    pub fn send_ephemeral(&self, chat_id: ChatId, text: String, ttl: Duration) -> JoinHandle<()> {
        let guard = self.clone();
        tokio::spawn(async move {
            let message_id = match guard.send_reliable(chat_id, &text, None).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(
                        target: "spamguard::ephemeral",
                        chat_id = chat_id.0,
                        error = %e,
                        "failed to post ephemeral notice"
                    );
                    return;
                },
            };

            tokio::time::sleep(ttl).await;

            match guard.delete_reliable(chat_id, message_id).await {
                Ok(()) | Err(DeliveryError::AlreadyGone) => {
                    debug!(chat_id = chat_id.0, message_id = message_id.0, "ephemeral notice expired");
                    #[cfg(feature = "metrics")]
                    counter!(delivery_metrics::EPHEMERAL_EXPIRED_TOTAL).increment(1);
                },
                Err(e) => warn!(
                    target: "spamguard::ephemeral",
                    chat_id = chat_id.0,
                    message_id = message_id.0,
                    error = %e,
                    "failed to delete ephemeral notice"
                ),
            }
        })
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        chat_id: ChatId,
        mut request: F,
    ) -> Result<T, DeliveryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DeliveryError>>,
    {
        let mut retries = 0u32;
        let mut waited = Duration::ZERO;

        loop {
            let err = match request().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let Some(wait) = err.retry_after() else {
                #[cfg(feature = "metrics")]
                counter!(delivery_metrics::FAILURES_TOTAL, labels::KIND => operation).increment(1);
                return Err(err);
            };

            if retries >= self.policy.max_retries || waited + wait > self.policy.max_total_wait {
                warn!(
                    chat_id = chat_id.0,
                    operation,
                    retries,
                    max_retries = self.policy.max_retries,
                    waited_secs = waited.as_secs(),
                    retry_after_secs = wait.as_secs(),
                    "rate limit persisted, giving up"
                );
                #[cfg(feature = "metrics")]
                counter!(delivery_metrics::FAILURES_TOTAL, labels::KIND => operation).increment(1);
                return Err(err);
            }

            retries += 1;
            waited += wait;
            warn!(
                chat_id = chat_id.0,
                operation,
                retries,
                max_retries = self.policy.max_retries,
                retry_after_secs = wait.as_secs(),
                "rate limited, waiting before retry"
            );
            #[cfg(feature = "metrics")]
            counter!(delivery_metrics::RATE_LIMIT_RETRIES_TOTAL, labels::KIND => operation)
                .increment(1);
            tokio::time::sleep(wait).await;
        }
    }
}
