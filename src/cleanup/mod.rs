//! Bulk message cleanup: scanning history, picking what to delete and deleting it.
//!
//! A cleanup always runs through the same stages, in order:
//! confirmation (when the size is already known), collection, confirmation (for open ended sweeps),
//! deletion and finally auditing. The engine only talks to discord through the traits in [`transport`],
//! rate limits are waited out by wrapping those in a [`RetryingTransport`].

use chrono::{DateTime, Utc};
use twilight_model::id::{ChannelId, MessageId};

pub use audit::{Actor, AuditLogger, AuditRecord, AuditSink, JsonLinesSink};
pub use collector::{collect, Batch, StopReason};
pub use confirmation::ConfirmationGate;
pub use executor::{DeletionExecutor, DeletionReport, ExecutionCapability, Identity, MAX_BULK_DELETE};
pub use filter::{AgeWindow, CommandMatcher, Criterion, EligibilityFilter};
pub use message::HistoryMessage;
pub use pipeline::{CleanupEngine, CleanupOutcome, CleanupSettings};
pub use retry::{RetryPolicy, RetryingTransport};
pub use scanner::{HistoryScanner, MAX_PAGE_SIZE};

pub mod audit;
mod collector;
pub mod confirmation;
mod executor;
pub mod filter;
mod message;
mod pipeline;
pub mod retry;
mod scanner;
pub mod transport;

#[cfg(test)]
pub mod testing;

/// Page size used when a request doesn't ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Everything needed to run one cleanup, built per command invocation.
#[derive(Debug, Clone)]
pub struct DeletionRequest {
    pub channel_id: ChannelId,
    /// How many messages to delete, `0` takes every eligible message.
    pub requested_count: usize,
    pub filter: EligibilityFilter,
    pub page_size: u64,
    pub before: Option<MessageId>,
    pub after: Option<MessageId>,
    /// Refuse to run at all when bulk deletion isn't possible.
    pub requires_bulk: bool,
    /// Deleted along with the batch, without being scanned for.
    pub trailing: Option<HistoryMessage>,
}

impl DeletionRequest {
    /// A request whose age window is counted back from `requested_at`.
    pub fn new(channel_id: ChannelId, requested_count: usize, criterion: Criterion, requested_at: DateTime<Utc>) -> Self {
        DeletionRequest {
            channel_id,
            requested_count,
            filter: EligibilityFilter::new(criterion, AgeWindow::bulk_deletable(requested_at)),
            page_size: DEFAULT_PAGE_SIZE,
            before: None,
            after: None,
            requires_bulk: false,
            trailing: None,
        }
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn before(mut self, message_id: MessageId) -> Self {
        self.before = Some(message_id);
        self
    }

    pub fn after(mut self, message_id: MessageId) -> Self {
        self.after = Some(message_id);
        self
    }

    pub fn admitting(mut self, trigger: MessageId) -> Self {
        self.filter = self.filter.admitting(trigger);
        self
    }

    pub fn requiring_bulk(mut self) -> Self {
        self.requires_bulk = true;
        self
    }

    pub fn with_trailing(mut self, message: HistoryMessage) -> Self {
        self.trailing = Some(message);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.requested_count == 0
    }

    /// Whether a batch of `len` messages satisfies the request.
    pub fn is_filled(&self, len: usize) -> bool {
        !self.is_unbounded() && len >= self.requested_count
    }
}
