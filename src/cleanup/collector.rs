use log::debug;
use twilight_model::id::MessageId;

use crate::cleanup::filter::Verdict;
use crate::cleanup::scanner::HistoryScanner;
use crate::cleanup::transport::MessageSource;
use crate::cleanup::{DeletionRequest, HistoryMessage};
use crate::error::{CleanupError, TransportError};

/// Why a collection stopped scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested amount of messages was found.
    Filled,
    /// There is no more history to scan.
    Exhausted,
    /// The scan reached messages too old to be deleted.
    WindowExceeded,
}

/// The messages picked for deletion, in the order they were scanned.
#[derive(Debug, Clone)]
pub struct Batch {
    messages: Vec<HistoryMessage>,
    stop_reason: StopReason,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[HistoryMessage] {
        &self.messages
    }

    pub fn ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// Tacks a message onto the end of the batch, skipping it if it's already in there.
    pub(crate) fn append(&mut self, message: HistoryMessage) {
        if !self.messages.iter().any(|m| m.id == message.id) {
            self.messages.push(message);
        }
    }
}

/// Scans the requested channel and gathers every message that is eligible for deletion.
///
/// Nothing is deleted here. The scan ends at the first message outside the age window, in either
/// direction. A forward sweep from an anchor that is already too old collects nothing.
pub async fn collect<S>(source: &S, request: &DeletionRequest) -> Result<Batch, CleanupError>
where
    S: MessageSource + ?Sized,
{
    let mut scanner = HistoryScanner::new(
        source,
        request.channel_id,
        request.page_size,
        request.before,
        request.after,
    );
    let mut messages = Vec::new();
    let mut stop_reason = StopReason::Exhausted;

    'pages: while !request.is_filled(messages.len()) {
        let page = match scanner.next_page().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(TransportError::Forbidden) => return Err(CleanupError::ChannelUnavailable(request.channel_id)),
            Err(e) => return Err(e.into()),
        };

        for message in page {
            match request.filter.evaluate(&message) {
                Verdict::Delete => {
                    messages.push(message);
                    if request.is_filled(messages.len()) {
                        break 'pages;
                    }
                }
                Verdict::Skip => {}
                Verdict::OutsideWindow => {
                    stop_reason = StopReason::WindowExceeded;
                    break 'pages;
                }
            }
        }
    }

    if request.is_filled(messages.len()) {
        stop_reason = StopReason::Filled;
    }

    debug!(
        "Collected {} messages in channel {} over {} pages ({:?})",
        messages.len(),
        request.channel_id,
        scanner.pages_fetched(),
        stop_reason
    );

    Ok(Batch { messages, stop_reason })
}
