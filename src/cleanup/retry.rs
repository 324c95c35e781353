use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use twilight_model::id::{ChannelId, MessageId, UserId};

use crate::cleanup::transport::{Conversation, Cursor, MessageRemover, MessageSource};
use crate::cleanup::HistoryMessage;
use crate::error::TransportError;

pub const DEFAULT_RATE_LIMIT_RETRIES: u32 = 3;
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_millis(1000);

/// How rate limited calls are tried again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries per call, after these the rate limit is handed to the caller.
    pub retries: u32,
    /// First wait when discord doesn't say how long to wait, doubled on every retry after that.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: DEFAULT_RATE_LIMIT_RETRIES,
            backoff: DEFAULT_RATE_LIMIT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// The wait before retry number `retry` (zero based).
    pub fn delay(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(wait) => wait,
            None => self
                .backoff
                .checked_mul(1 << retry.min(16))
                .unwrap_or(self.backoff),
        }
    }
}

/// Wraps a transport so rate limits are waited out instead of failing the call.
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        RetryingTransport { inner, policy }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    async fn call<F, Fut, R>(&self, what: &str, mut attempt: F) -> Result<R, TransportError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<R, TransportError>> + Send,
        R: Send,
    {
        let mut retry = 0;
        loop {
            match attempt().await {
                Err(TransportError::RateLimited { retry_after }) if retry < self.policy.retries => {
                    let delay = self.policy.delay(retry, retry_after);
                    retry += 1;
                    debug!(
                        "Rate limited while {}, retry {} of {} in {}ms",
                        what,
                        retry,
                        self.policy.retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e @ TransportError::RateLimited { .. }) => {
                    warn!("Still rate limited while {} after {} retries, giving up", what, retry);
                    return Err(e);
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<T: MessageSource> MessageSource for RetryingTransport<T> {
    async fn fetch_history(
        &self,
        channel_id: ChannelId,
        limit: u64,
        cursor: Cursor,
    ) -> Result<Vec<HistoryMessage>, TransportError> {
        let inner = &self.inner;
        self.call("fetching history", move || inner.fetch_history(channel_id, limit, cursor))
            .await
    }
}

#[async_trait]
impl<T: MessageRemover> MessageRemover for RetryingTransport<T> {
    async fn delete_messages_bulk(&self, channel_id: ChannelId, message_ids: &[MessageId]) -> Result<(), TransportError> {
        let inner = &self.inner;
        self.call("bulk deleting", move || inner.delete_messages_bulk(channel_id, message_ids))
            .await
    }

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<(), TransportError> {
        let inner = &self.inner;
        self.call("deleting a message", move || inner.delete_message(channel_id, message_id))
            .await
    }
}

#[async_trait]
impl<T: Conversation> Conversation for RetryingTransport<T> {
    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), TransportError> {
        let inner = &self.inner;
        self.call("sending a message", move || inner.send(channel_id, text)).await
    }

    async fn await_response(&self, channel_id: ChannelId, actor: UserId) -> Option<String> {
        self.inner.await_response(channel_id, actor).await
    }
}
