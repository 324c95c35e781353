use std::time::Duration;

use log::debug;
use twilight_model::id::{ChannelId, UserId};

use crate::cleanup::transport::Conversation;
use crate::error::CleanupError;

/// Cleanups above this size need an explicit yes from whoever asked for them.
pub const DEFAULT_CONFIRMATION_THRESHOLD: usize = 100;

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Asks the invoking user to confirm large deletions.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationGate {
    threshold: usize,
    timeout: Duration,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        ConfirmationGate::new(DEFAULT_CONFIRMATION_THRESHOLD, DEFAULT_CONFIRMATION_TIMEOUT)
    }
}

impl ConfirmationGate {
    pub fn new(threshold: usize, timeout: Duration) -> Self {
        ConfirmationGate { threshold, timeout }
    }

    pub fn requires_confirmation(&self, count: usize) -> bool {
        count > self.threshold
    }

    /// Passes straight through for small counts, otherwise prompts `actor` and waits for their answer.
    pub async fn confirm<C>(
        &self,
        conversation: &C,
        channel_id: ChannelId,
        actor: UserId,
        count: usize,
    ) -> Result<(), CleanupError>
    where
        C: Conversation + ?Sized,
    {
        if !self.requires_confirmation(count) {
            return Ok(());
        }

        conversation
            .send(
                channel_id,
                &format!("Are you sure you want to delete {} messages? (y/n)", count),
            )
            .await?;

        match tokio::time::timeout(self.timeout, conversation.await_response(channel_id, actor)).await {
            Ok(Some(answer)) if is_affirmative(&answer) => {
                debug!("{} confirmed the deletion of {} messages", actor, count);
                Ok(())
            }
            Ok(_) => Err(CleanupError::ConfirmationDeclined),
            Err(_) => Err(CleanupError::ConfirmationTimedOut),
        }
    }
}

/// Anything starting with a `y` is a yes.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim_start().to_lowercase().starts_with('y')
}
