use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::debug;
use tokio::sync::oneshot;
use twilight_model::id::{ChannelId, UserId};

type WaiterKey = (ChannelId, UserId);

/// Pending "answer me in this channel" waits, keyed by channel and author.
///
/// Incoming messages are offered here before command parsing, so the answer to a confirmation
/// prompt never gets interpreted as a command.
#[derive(Default)]
pub struct ReplyWaiters {
    pending: Mutex<HashMap<WaiterKey, oneshot::Sender<String>>>,
    closed: AtomicBool,
}

impl ReplyWaiters {
    pub fn new() -> Self {
        ReplyWaiters::default()
    }

    /// Registers interest in the next message of `user` in `channel_id`.
    ///
    /// Returns `None` once closed. A newer registration for the same key replaces (and ends) the older one.
    pub fn register(&self, channel_id: ChannelId, user_id: UserId) -> Option<oneshot::Receiver<String>> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        let (sender, receiver) = oneshot::channel();
        let mut pending = self.pending.lock().ok()?;
        if pending.insert((channel_id, user_id), sender).is_some() {
            debug!("Replaced an older reply wait for {} in {}", user_id, channel_id);
        }
        Some(receiver)
    }

    /// Hands a message to whoever waits for it, returns if someone took it.
    pub fn offer(&self, channel_id: ChannelId, user_id: UserId, content: &str) -> bool {
        let sender = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&(channel_id, user_id)),
            Err(_) => None,
        };
        match sender {
            Some(sender) => sender.send(content.to_string()).is_ok(),
            None => false,
        }
    }

    /// Drops the registration for this key if its receiver is gone.
    pub fn forget_abandoned(&self, channel_id: ChannelId, user_id: UserId) {
        if let Ok(mut pending) = self.pending.lock() {
            let abandoned = pending
                .get(&(channel_id, user_id))
                .map(|sender| sender.is_closed())
                .unwrap_or(false);
            if abandoned {
                pending.remove(&(channel_id, user_id));
            }
        }
    }

    /// Waits for the next message of `user` in `channel_id`, `None` if the wait gets ended.
    pub async fn wait_for(&self, channel_id: ChannelId, user_id: UserId) -> Option<String> {
        let receiver = self.register(channel_id, user_id)?;
        let mut pending = PendingReply {
            waiters: self,
            key: (channel_id, user_id),
            receiver: Some(receiver),
        };
        match pending.receiver.as_mut() {
            Some(receiver) => receiver.await.ok(),
            None => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Ends every wait and refuses new ones.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
    }
}

/// Cleans up after a wait, also when the waiting future is dropped halfway.
struct PendingReply<'a> {
    waiters: &'a ReplyWaiters,
    key: WaiterKey,
    receiver: Option<oneshot::Receiver<String>>,
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        self.receiver.take();
        self.waiters.forget_abandoned(self.key.0, self.key.1);
    }
}
