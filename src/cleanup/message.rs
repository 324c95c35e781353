use chrono::{DateTime, Duration, TimeZone, Utc};
use twilight_model::channel::Message;
use twilight_model::id::{ChannelId, MessageId, UserId};

/// Milliseconds between the unix epoch and the first second of 2015, the epoch of discord snowflakes.
const DISCORD_EPOCH: u64 = 1_420_070_400_000;

/// A snapshot of a channel message, only held for the duration of a single cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryMessage {
    /// Builds a message, its creation time is taken from the id.
    pub fn from_parts(id: MessageId, channel_id: ChannelId, author_id: UserId, content: String) -> Self {
        HistoryMessage {
            id,
            channel_id,
            author_id,
            content,
            created_at: snowflake_timestamp(id.0),
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }
}

impl From<&Message> for HistoryMessage {
    fn from(message: &Message) -> Self {
        HistoryMessage::from_parts(message.id, message.channel_id, message.author.id, message.content.clone())
    }
}

/// Extracts the creation time that is encoded in every snowflake id.
pub fn snowflake_timestamp(snowflake: u64) -> DateTime<Utc> {
    let millis = (snowflake >> 22) + DISCORD_EPOCH;
    Utc.timestamp_millis(millis as i64)
}
