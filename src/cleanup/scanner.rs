use log::trace;
use twilight_model::id::{ChannelId, MessageId};

use crate::cleanup::transport::{Cursor, MessageSource};
use crate::cleanup::HistoryMessage;
use crate::error::TransportError;

/// Largest page a single scan step may ask for.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// The order in which a scan visits messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Newest to oldest.
    Backward,
    /// Oldest to newest.
    Forward,
}

/// Walks a channel's history one page at a time.
///
/// The cursor only ever moves forward in the scan direction, so a scanner can not be rewound. Once it
/// reports the end of the history it keeps doing so without touching the source again.
pub struct HistoryScanner<'a, S: ?Sized> {
    source: &'a S,
    channel_id: ChannelId,
    page_size: u64,
    direction: Direction,
    cursor: Cursor,
    /// Forward scans with an upper bound stop before reaching this message.
    stop_at: Option<MessageId>,
    exhausted: bool,
    pages: usize,
}

impl<'a, S> HistoryScanner<'a, S>
where
    S: MessageSource + ?Sized,
{
    pub fn new(
        source: &'a S,
        channel_id: ChannelId,
        page_size: u64,
        before: Option<MessageId>,
        after: Option<MessageId>,
    ) -> Self {
        let (direction, cursor, stop_at) = match (before, after) {
            (before, Some(after)) => (Direction::Forward, Cursor::After(after), before),
            (Some(before), None) => (Direction::Backward, Cursor::Before(before), None),
            (None, None) => (Direction::Backward, Cursor::Latest, None),
        };

        HistoryScanner {
            source,
            channel_id,
            page_size: page_size.max(1).min(MAX_PAGE_SIZE),
            direction,
            cursor,
            stop_at,
            exhausted: false,
            pages: 0,
        }
    }

    /// How many pages have been fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// Fetches the next page, `Ok(None)` once the history is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<HistoryMessage>>, TransportError> {
        if self.exhausted {
            return Ok(None);
        }

        let mut page = self
            .source
            .fetch_history(self.channel_id, self.page_size, self.cursor)
            .await?;
        self.pages += 1;

        if let Some(stop_at) = self.stop_at {
            if let Some(position) = page.iter().position(|message| message.id >= stop_at) {
                page.truncate(position);
                self.exhausted = true;
            }
        }

        match page.last() {
            Some(last) => {
                self.cursor = match self.direction {
                    Direction::Backward => Cursor::Before(last.id),
                    Direction::Forward => Cursor::After(last.id),
                };
                trace!(
                    "Scanned page {} of channel {} ({} messages)",
                    self.pages,
                    self.channel_id,
                    page.len()
                );
                Ok(Some(page))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::testing::FakeChannel;

    #[tokio::test]
    async fn backward_scans_page_until_exhausted() {
        let channel = FakeChannel::with_ages(&[1, 2, 3, 4, 5]);
        let mut scanner = HistoryScanner::new(&channel, channel.id(), 2, None, None);

        let mut seen = vec![];
        while let Some(page) = scanner.next_page().await.unwrap() {
            assert!(page.len() <= 2);
            seen.extend(page.into_iter().map(|m| m.id));
        }

        assert_eq!(seen, channel.ids_newest_first());
        // three full or partial pages plus the empty one that ends the scan
        assert_eq!(scanner.pages_fetched(), 4);

        // exhausted scanners don't go back to the source
        assert!(scanner.next_page().await.unwrap().is_none());
        assert_eq!(channel.fetch_count(), 4);
    }

    #[tokio::test]
    async fn forward_scans_visit_oldest_first() {
        let channel = FakeChannel::with_ages(&[1, 2, 3, 4, 5]);
        let ids = channel.ids_newest_first();
        let anchor = ids[4];
        let mut scanner = HistoryScanner::new(&channel, channel.id(), 10, None, Some(anchor));

        let page = scanner.next_page().await.unwrap().unwrap();
        let expected: Vec<_> = ids[..4].iter().rev().copied().collect();
        assert_eq!(page.into_iter().map(|m| m.id).collect::<Vec<_>>(), expected);
    }

    #[tokio::test]
    async fn forward_scans_stop_at_the_upper_bound() {
        let channel = FakeChannel::with_ages(&[1, 2, 3, 4, 5]);
        let ids = channel.ids_newest_first();
        let mut scanner = HistoryScanner::new(&channel, channel.id(), 10, Some(ids[1]), Some(ids[4]));

        let page = scanner.next_page().await.unwrap().unwrap();
        assert_eq!(page.into_iter().map(|m| m.id).collect::<Vec<_>>(), vec![ids[3], ids[2]]);
        assert!(scanner.next_page().await.unwrap().is_none());
        assert_eq!(channel.fetch_count(), 1);
    }

    #[tokio::test]
    async fn page_size_is_capped() {
        let channel = FakeChannel::with_ages(&[1]);
        let mut scanner = HistoryScanner::new(&channel, channel.id(), 50_000, None, None);
        scanner.next_page().await.unwrap();

        assert_eq!(channel.requested_limits(), vec![MAX_PAGE_SIZE]);
    }

    #[tokio::test]
    async fn authorization_errors_surface_immediately() {
        let channel = FakeChannel::with_ages(&[1, 2]);
        channel.deny_history();
        let mut scanner = HistoryScanner::new(&channel, channel.id(), 10, None, None);

        match scanner.next_page().await {
            Err(TransportError::Forbidden) => {}
            other => panic!("expected a forbidden error, got {:?}", other),
        }
    }
}
