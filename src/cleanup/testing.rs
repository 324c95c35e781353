//! An in-memory channel for exercising the cleanup engine without discord.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use twilight_model::id::{ChannelId, MessageId, UserId};

use crate::cleanup::message::snowflake_timestamp;
use crate::cleanup::transport::{Conversation, Cursor, MessageRemover, MessageSource};
use crate::cleanup::HistoryMessage;
use crate::error::TransportError;

pub const DEFAULT_AUTHOR: UserId = UserId(100);

const DISCORD_EPOCH: i64 = 1_420_070_400_000;

#[derive(Default)]
struct State {
    /// Oldest first.
    messages: Vec<HistoryMessage>,
    fetches: Vec<(u64, Cursor)>,
    bulk_calls: Vec<Vec<MessageId>>,
    single_calls: Vec<MessageId>,
    deny_history: bool,
    failing_bulk_call: Option<usize>,
    failing_messages: HashSet<MessageId>,
    /// `None` entries never get answered.
    replies: VecDeque<Option<String>>,
    sent: Vec<String>,
    /// How many of the next calls get rate limited, and the wait discord asks for.
    rate_limits: usize,
    retry_after: Option<StdDuration>,
    rate_limited_calls: usize,
}

impl State {
    fn rate_limited(&mut self) -> Result<(), TransportError> {
        if self.rate_limits == 0 {
            return Ok(());
        }
        self.rate_limits -= 1;
        self.rate_limited_calls += 1;
        Err(TransportError::RateLimited {
            retry_after: self.retry_after,
        })
    }
}

pub struct FakeChannel {
    channel_id: ChannelId,
    now: DateTime<Utc>,
    state: Mutex<State>,
}

impl FakeChannel {
    pub fn new() -> Self {
        FakeChannel {
            channel_id: ChannelId(555),
            now: Utc.timestamp_millis(1_700_000_000_000),
            state: Mutex::new(State::default()),
        }
    }

    /// A channel with one message per age (in days), all by [`DEFAULT_AUTHOR`].
    pub fn with_ages(ages: &[i64]) -> Self {
        let channel = FakeChannel::new();
        for (i, age) in ages.iter().enumerate() {
            channel.push(Duration::days(*age), DEFAULT_AUTHOR, &format!("message {}", i));
        }
        channel
    }

    pub fn id(&self) -> ChannelId {
        self.channel_id
    }

    /// The reference time all ages are measured against.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Adds a message of the given age, returning its id.
    pub fn push(&self, age: Duration, author: UserId, content: &str) -> MessageId {
        let created = self.now - age;
        let mut state = self.state.lock().unwrap();
        // the low bits keep ids unique for messages created in the same millisecond
        let mut id = (((created.timestamp_millis() - DISCORD_EPOCH) as u64) << 22) + state.messages.len() as u64;
        while state.messages.iter().any(|m| m.id.0 == id) {
            id += 1;
        }
        let message = HistoryMessage {
            id: MessageId(id),
            channel_id: self.channel_id,
            author_id: author,
            content: content.to_string(),
            created_at: snowflake_timestamp(id),
        };
        state.messages.push(message);
        state.messages.sort_by_key(|m| m.id);
        MessageId(id)
    }

    pub fn ids_newest_first(&self) -> Vec<MessageId> {
        let state = self.state.lock().unwrap();
        state.messages.iter().rev().map(|m| m.id).collect()
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.state.lock().unwrap().messages.iter().any(|m| m.id == id)
    }

    pub fn deny_history(&self) {
        self.state.lock().unwrap().deny_history = true;
    }

    /// Makes the n-th (zero based) bulk delete call fail.
    pub fn fail_bulk_call(&self, n: usize) {
        self.state.lock().unwrap().failing_bulk_call = Some(n);
    }

    pub fn fail_message(&self, id: MessageId) {
        self.state.lock().unwrap().failing_messages.insert(id);
    }

    /// Rate limits the next `calls` calls, whatever they are.
    pub fn rate_limit(&self, calls: usize, retry_after: Option<StdDuration>) {
        let mut state = self.state.lock().unwrap();
        state.rate_limits = calls;
        state.retry_after = retry_after;
    }

    pub fn rate_limited_calls(&self) -> usize {
        self.state.lock().unwrap().rate_limited_calls
    }

    pub fn queue_reply(&self, reply: &str) {
        self.state.lock().unwrap().replies.push_back(Some(reply.to_string()));
    }

    pub fn queue_silence(&self) {
        self.state.lock().unwrap().replies.push_back(None);
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches.len()
    }

    pub fn requested_limits(&self) -> Vec<u64> {
        self.state.lock().unwrap().fetches.iter().map(|(limit, _)| *limit).collect()
    }

    pub fn bulk_calls(&self) -> Vec<Vec<MessageId>> {
        self.state.lock().unwrap().bulk_calls.clone()
    }

    pub fn single_calls(&self) -> Vec<MessageId> {
        self.state.lock().unwrap().single_calls.clone()
    }

    pub fn deletion_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.bulk_calls.len() + state.single_calls.len()
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl MessageSource for FakeChannel {
    async fn fetch_history(
        &self,
        _channel_id: ChannelId,
        limit: u64,
        cursor: Cursor,
    ) -> Result<Vec<HistoryMessage>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.rate_limited()?;
        state.fetches.push((limit, cursor));
        if state.deny_history {
            return Err(TransportError::Forbidden);
        }

        let limit = limit as usize;
        let page = match cursor {
            Cursor::Latest => state.messages.iter().rev().take(limit).cloned().collect(),
            Cursor::Before(before) => state
                .messages
                .iter()
                .rev()
                .filter(|m| m.id < before)
                .take(limit)
                .cloned()
                .collect(),
            Cursor::After(after) => state
                .messages
                .iter()
                .filter(|m| m.id > after)
                .take(limit)
                .cloned()
                .collect(),
        };
        Ok(page)
    }
}

#[async_trait]
impl MessageRemover for FakeChannel {
    async fn delete_messages_bulk(&self, _channel_id: ChannelId, message_ids: &[MessageId]) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.rate_limited()?;
        let call = state.bulk_calls.len();
        state.bulk_calls.push(message_ids.to_vec());
        if state.failing_bulk_call == Some(call) {
            return Err(TransportError::Failed(format!("bulk delete call {} rejected", call)));
        }
        state.messages.retain(|m| !message_ids.contains(&m.id));
        Ok(())
    }

    async fn delete_message(&self, _channel_id: ChannelId, message_id: MessageId) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.rate_limited()?;
        state.single_calls.push(message_id);
        if state.failing_messages.contains(&message_id) {
            return Err(TransportError::Failed(format!("deleting {} rejected", message_id)));
        }
        let before = state.messages.len();
        state.messages.retain(|m| m.id != message_id);
        if state.messages.len() == before {
            Err(TransportError::NotFound)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Conversation for FakeChannel {
    async fn send(&self, _channel_id: ChannelId, text: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.rate_limited()?;
        state.sent.push(text.to_string());
        Ok(())
    }

    async fn await_response(&self, _channel_id: ChannelId, _actor: UserId) -> Option<String> {
        let reply = self.state.lock().unwrap().replies.pop_front();
        match reply {
            Some(Some(text)) => Some(text),
            Some(None) => std::future::pending().await,
            None => None,
        }
    }
}
