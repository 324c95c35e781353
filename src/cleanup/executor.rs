use std::time::Duration;

use log::{debug, warn};
use twilight_model::guild::Permissions;
use twilight_model::id::{ChannelId, MessageId, UserId};

use crate::cleanup::transport::MessageRemover;
use crate::cleanup::Batch;
use crate::error::{CleanupError, TransportError};

/// The most messages a single bulk delete call accepts.
pub const MAX_BULK_DELETE: usize = 100;

/// The identity the bot acts as, with its permissions in the target channel.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: UserId,
    pub is_bot_account: bool,
    pub channel_permissions: Permissions,
}

/// Which deletion strategy an identity is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionCapability {
    PrivilegedBulk,
    UnprivilegedSequential,
}

impl ExecutionCapability {
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.is_bot_account && identity.channel_permissions.contains(Permissions::MANAGE_MESSAGES) {
            ExecutionCapability::PrivilegedBulk
        } else {
            ExecutionCapability::UnprivilegedSequential
        }
    }
}

/// How a batch gets removed, picked once per cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionExecutor {
    Bulk,
    Sequential { delay: Duration },
}

/// What happened to a batch.
#[derive(Debug)]
pub struct DeletionReport {
    pub executor: DeletionExecutor,
    pub attempted: usize,
    pub removed: usize,
    /// Messages that are still there.
    pub failed: Vec<MessageId>,
    /// The error that stopped a bulk deletion early.
    pub aborted_by: Option<TransportError>,
}

impl DeletionReport {
    pub fn is_complete(&self) -> bool {
        self.removed == self.attempted
    }

    pub fn into_result(self) -> Result<DeletionReport, CleanupError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(CleanupError::PartialDeletionFailure {
                removed: self.removed,
                total: self.attempted,
            })
        }
    }
}

impl DeletionExecutor {
    pub fn select(capability: ExecutionCapability, sequential_delay: Duration) -> Self {
        match capability {
            ExecutionCapability::PrivilegedBulk => DeletionExecutor::Bulk,
            ExecutionCapability::UnprivilegedSequential => DeletionExecutor::Sequential {
                delay: sequential_delay,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeletionExecutor::Bulk => "bulk",
            DeletionExecutor::Sequential { .. } => "sequential",
        }
    }

    /// Removes everything in the batch. Runs to completion once started.
    pub async fn execute<R>(&self, remover: &R, channel_id: ChannelId, batch: &Batch) -> DeletionReport
    where
        R: MessageRemover + ?Sized,
    {
        let ids = batch.ids();
        match self {
            DeletionExecutor::Bulk => self.execute_bulk(remover, channel_id, ids).await,
            DeletionExecutor::Sequential { delay } => self.execute_sequential(remover, channel_id, ids, *delay).await,
        }
    }

    /// Chunks go out one after the other, the first failing chunk ends the run.
    async fn execute_bulk<R>(&self, remover: &R, channel_id: ChannelId, ids: Vec<MessageId>) -> DeletionReport
    where
        R: MessageRemover + ?Sized,
    {
        let attempted = ids.len();
        let mut removed = 0;
        let mut failed = vec![];
        let mut aborted_by = None;

        for (index, chunk) in ids.chunks(MAX_BULK_DELETE).enumerate() {
            // the bulk endpoint refuses a single id
            let result = match chunk {
                [single] => remove_single(remover, channel_id, *single).await,
                chunk => remover.delete_messages_bulk(channel_id, chunk).await,
            };

            match result {
                Ok(()) => {
                    removed += chunk.len();
                    debug!("Bulk deleted chunk {} ({} messages) in {}", index, chunk.len(), channel_id);
                }
                Err(e) => {
                    warn!(
                        "Bulk deletion in {} failed on chunk {}, {} of {} messages removed: {}",
                        channel_id, index, removed, attempted, e
                    );
                    failed.extend_from_slice(&ids[removed..]);
                    aborted_by = Some(e);
                    break;
                }
            }
        }

        DeletionReport {
            executor: *self,
            attempted,
            removed,
            failed,
            aborted_by,
        }
    }

    /// One message at a time, a failure only costs that one message.
    async fn execute_sequential<R>(
        &self,
        remover: &R,
        channel_id: ChannelId,
        ids: Vec<MessageId>,
        delay: Duration,
    ) -> DeletionReport
    where
        R: MessageRemover + ?Sized,
    {
        let attempted = ids.len();
        let mut removed = 0;
        let mut failed = vec![];

        for (index, id) in ids.into_iter().enumerate() {
            if index > 0 && delay > Duration::from_millis(0) {
                tokio::time::sleep(delay).await;
            }

            match remove_single(remover, channel_id, id).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!("Failed to delete message {} in {}, skipping it: {}", id, channel_id, e);
                    failed.push(id);
                }
            }
        }

        DeletionReport {
            executor: *self,
            attempted,
            removed,
            failed,
            aborted_by: None,
        }
    }
}

/// Deletes one message, a message that is already gone counts as deleted.
async fn remove_single<R>(remover: &R, channel_id: ChannelId, id: MessageId) -> Result<(), TransportError>
where
    R: MessageRemover + ?Sized,
{
    match remover.delete_message(channel_id, id).await {
        Err(TransportError::NotFound) => {
            debug!("Message {} in {} was already deleted", id, channel_id);
            Ok(())
        }
        result => result,
    }
}
