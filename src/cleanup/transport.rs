use async_trait::async_trait;
use twilight_model::id::{ChannelId, MessageId, UserId};

use crate::cleanup::HistoryMessage;
use crate::error::TransportError;

/// Where to resume reading history from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// The most recent messages in the channel.
    Latest,
    /// Messages strictly older than the given one.
    Before(MessageId),
    /// Messages strictly newer than the given one.
    After(MessageId),
}

/// Read access to a channel's message history.
///
/// Implementations return messages in the direction the cursor points: newest first for
/// [`Cursor::Latest`] and [`Cursor::Before`], oldest first for [`Cursor::After`]. An empty
/// page means there is nothing left in that direction.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch_history(
        &self,
        channel_id: ChannelId,
        limit: u64,
        cursor: Cursor,
    ) -> Result<Vec<HistoryMessage>, TransportError>;
}

/// The two deletion primitives offered by the platform.
#[async_trait]
pub trait MessageRemover: Send + Sync {
    /// Removes between 2 and [`MAX_BULK_DELETE`](crate::cleanup::MAX_BULK_DELETE) messages in one call.
    async fn delete_messages_bulk(&self, channel_id: ChannelId, message_ids: &[MessageId]) -> Result<(), TransportError>;

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<(), TransportError>;
}

/// Talking to the invoking user, used to ask for confirmation.
#[async_trait]
pub trait Conversation: Send + Sync {
    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), TransportError>;

    /// Waits for the next message from `actor` in `channel_id`.
    ///
    /// Returns `None` when the wait can no longer be satisfied, for example because the bot is shutting down.
    async fn await_response(&self, channel_id: ChannelId, actor: UserId) -> Option<String>;
}
