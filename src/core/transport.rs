use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use hyper::StatusCode;
use log::trace;
use serde::Deserialize;
use twilight_http::{Client as HttpClient, Error};
use twilight_model::id::{ChannelId, MessageId, UserId};

use crate::cleanup::transport::{Conversation, Cursor, MessageRemover, MessageSource};
use crate::cleanup::HistoryMessage;
use crate::core::ReplyWaiters;
use crate::error::TransportError;

/// The most messages discord hands out per history request.
const HISTORY_REQUEST_LIMIT: u64 = 100;

/// Cleanup access to discord channels, backed by the REST api.
pub struct TwilightChannel<'a> {
    http: &'a HttpClient,
    waiters: &'a ReplyWaiters,
}

impl<'a> TwilightChannel<'a> {
    pub fn new(http: &'a HttpClient, waiters: &'a ReplyWaiters) -> Self {
        TwilightChannel { http, waiters }
    }

    async fn fetch_chunk(
        &self,
        channel_id: ChannelId,
        limit: u64,
        cursor: Cursor,
    ) -> Result<Vec<HistoryMessage>, TransportError> {
        let request = self
            .http
            .channel_messages(channel_id)
            .limit(limit)
            .map_err(|e| TransportError::Failed(e.to_string()))?;

        let messages = match cursor {
            Cursor::Latest => request.await,
            Cursor::Before(message_id) => request.before(message_id).await,
            Cursor::After(message_id) => request.after(message_id).await,
        }
        .map_err(map_http_error)?;

        Ok(messages.iter().map(HistoryMessage::from).collect())
    }
}

#[async_trait]
impl MessageSource for TwilightChannel<'_> {
    async fn fetch_history(
        &self,
        channel_id: ChannelId,
        limit: u64,
        cursor: Cursor,
    ) -> Result<Vec<HistoryMessage>, TransportError> {
        fetch_in_chunks(limit, cursor, |wanted, cursor| self.fetch_chunk(channel_id, wanted, cursor)).await
    }
}

/// Reads up to `limit` messages in requests discord accepts, following the cursor from one to the next.
async fn fetch_in_chunks<F, Fut>(limit: u64, cursor: Cursor, mut fetch: F) -> Result<Vec<HistoryMessage>, TransportError>
where
    F: FnMut(u64, Cursor) -> Fut,
    Fut: Future<Output = Result<Vec<HistoryMessage>, TransportError>>,
{
    let mut page: Vec<HistoryMessage> = Vec::new();
    let mut cursor = cursor;
    while (page.len() as u64) < limit {
        let wanted = (limit - page.len() as u64).min(HISTORY_REQUEST_LIMIT);
        let mut chunk = fetch(wanted, cursor).await?;
        trace!("Fetched {} messages ({:?})", chunk.len(), cursor);

        // discord doesn't promise an order, the scanner needs one
        match cursor {
            Cursor::After(_) => chunk.sort_by_key(|message| message.id.0),
            _ => chunk.sort_by(|a, b| b.id.0.cmp(&a.id.0)),
        }

        let exhausted = (chunk.len() as u64) < wanted;
        cursor = match (cursor, chunk.last()) {
            (_, None) => break,
            (Cursor::After(_), Some(last)) => Cursor::After(last.id),
            (_, Some(last)) => Cursor::Before(last.id),
        };
        page.extend(chunk);
        if exhausted {
            break;
        }
    }
    Ok(page)
}

#[async_trait]
impl MessageRemover for TwilightChannel<'_> {
    async fn delete_messages_bulk(&self, channel_id: ChannelId, message_ids: &[MessageId]) -> Result<(), TransportError> {
        self.http
            .delete_messages(channel_id, message_ids.to_vec())
            .await
            .map_err(map_http_error)
    }

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<(), TransportError> {
        self.http
            .delete_message(channel_id, message_id)
            .await
            .map_err(map_http_error)
    }
}

#[async_trait]
impl Conversation for TwilightChannel<'_> {
    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), TransportError> {
        self.http
            .create_message(channel_id)
            .content(text)
            .map_err(|e| TransportError::Failed(e.to_string()))?
            .await
            .map_err(map_http_error)?;
        Ok(())
    }

    async fn await_response(&self, channel_id: ChannelId, actor: UserId) -> Option<String> {
        self.waiters.wait_for(channel_id, actor).await
    }
}

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Sorts discord's error responses into the few cases a cleanup cares about.
pub fn map_http_error(error: Error) -> TransportError {
    match error {
        Error::Response { status, .. } if status == StatusCode::FORBIDDEN => TransportError::Forbidden,
        Error::Response { status, .. } if status == StatusCode::NOT_FOUND => TransportError::NotFound,
        Error::Response { status, body, .. } if status == StatusCode::TOO_MANY_REQUESTS => {
            TransportError::RateLimited {
                retry_after: parse_retry_after(&body),
            }
        }
        e => TransportError::Twilight(e),
    }
}

fn parse_retry_after(body: &[u8]) -> Option<Duration> {
    serde_json::from_slice::<RateLimitBody>(body)
        .ok()
        .filter(|body| body.retry_after.is_finite() && body.retry_after >= 0.0)
        .map(|body| Duration::from_secs_f64(body.retry_after))
}
