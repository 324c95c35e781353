use std::time::Duration;

use log::{debug, info};

use crate::cleanup::transport::{Conversation, MessageRemover, MessageSource};
use crate::cleanup::{
    collect, Actor, AuditLogger, AuditRecord, ConfirmationGate, DeletionExecutor, DeletionReport, DeletionRequest,
    ExecutionCapability, Identity, RetryPolicy, DEFAULT_PAGE_SIZE,
};
use crate::error::CleanupError;

pub const DEFAULT_SEQUENTIAL_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy)]
pub struct CleanupSettings {
    pub confirmation: ConfirmationGate,
    pub page_size: u64,
    /// Pause between two single message deletions.
    pub sequential_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        CleanupSettings {
            confirmation: ConfirmationGate::default(),
            page_size: DEFAULT_PAGE_SIZE,
            sequential_delay: DEFAULT_SEQUENTIAL_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

/// A cleanup that deleted everything it set out to delete.
#[derive(Debug)]
pub struct CleanupOutcome {
    pub matched: usize,
    pub report: DeletionReport,
    pub audited: bool,
}

pub struct CleanupEngine {
    settings: CleanupSettings,
    audit: AuditLogger,
}

impl CleanupEngine {
    pub fn new(settings: CleanupSettings, audit: AuditLogger) -> Self {
        CleanupEngine { settings, audit }
    }

    pub fn settings(&self) -> &CleanupSettings {
        &self.settings
    }

    /// Runs a single cleanup from start to finish.
    ///
    /// Confirmation always happens before the first deletion call. Once deleting has started it runs to
    /// the end, and whatever got deleted is audited before returning, partial failures included.
    pub async fn run<T>(
        &self,
        transport: &T,
        actor: &Actor,
        identity: &Identity,
        request: DeletionRequest,
    ) -> Result<CleanupOutcome, CleanupError>
    where
        T: MessageSource + MessageRemover + Conversation + ?Sized,
    {
        let capability = ExecutionCapability::for_identity(identity);
        if request.requires_bulk && capability != ExecutionCapability::PrivilegedBulk {
            return Err(CleanupError::InsufficientPrivilege);
        }

        let gate = &self.settings.confirmation;
        if !request.is_unbounded() {
            gate.confirm(transport, request.channel_id, actor.id, request.requested_count)
                .await?;
        }

        let mut batch = collect(transport, &request).await?;
        let matched = batch.len();

        if request.is_unbounded() {
            gate.confirm(transport, request.channel_id, actor.id, batch.len()).await?;
        }

        if let Some(trailing) = request.trailing.clone() {
            batch.append(trailing);
        }

        let executor = DeletionExecutor::select(capability, self.settings.sequential_delay);
        debug!(
            "Deleting {} messages in {} using the {} strategy",
            batch.len(),
            request.channel_id,
            executor.name()
        );
        let report = executor.execute(transport, request.channel_id, &batch).await;

        let record = AuditRecord::new(
            actor.clone(),
            request.channel_id,
            matched,
            report.removed,
            request.filter.criterion().to_string(),
            executor.name(),
        );
        let audited = self.audit.record(&record);

        let report = report.into_result()?;
        info!("Cleanup {} in {} finished", record.id, request.channel_id);

        Ok(CleanupOutcome {
            matched,
            report,
            audited,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::audit::memory::MemorySink;
    use crate::cleanup::testing::{FakeChannel, DEFAULT_AUTHOR};
    use crate::cleanup::Criterion;
    use chrono::Duration as ChronoDuration;
    use twilight_model::guild::Permissions;
    use twilight_model::id::UserId;

    const BOT: UserId = UserId(9);

    fn engine(sink: &MemorySink) -> CleanupEngine {
        let settings = CleanupSettings {
            confirmation: ConfirmationGate::new(100, Duration::from_millis(50)),
            page_size: 100,
            sequential_delay: Duration::from_millis(0),
            retry: RetryPolicy::default(),
        };
        CleanupEngine::new(settings, AuditLogger::new().with_sink(sink.clone()))
    }

    fn moderator() -> Actor {
        Actor {
            id: UserId(77),
            name: String::from("moderator"),
        }
    }

    fn bot(channel_permissions: Permissions) -> Identity {
        Identity {
            user_id: BOT,
            is_bot_account: true,
            channel_permissions,
        }
    }

    fn privileged() -> Identity {
        bot(Permissions::MANAGE_MESSAGES)
    }

    fn fill(channel: &FakeChannel, count: i64) {
        for i in 0..count {
            channel.push(ChronoDuration::minutes(count - i), DEFAULT_AUTHOR, "spam");
        }
    }

    #[tokio::test]
    async fn text_cleanup_deletes_only_recent_matches() {
        let channel = FakeChannel::new();
        channel.push(ChronoDuration::days(15), DEFAULT_AUTHOR, "x old");
        let third = channel.push(ChronoDuration::days(3), DEFAULT_AUTHOR, "x");
        channel.push(ChronoDuration::days(2), DEFAULT_AUTHOR, "y");
        let first = channel.push(ChronoDuration::days(1), DEFAULT_AUTHOR, "x");
        let sink = MemorySink::default();

        let request = DeletionRequest::new(channel.id(), 10, Criterion::Substring("x".to_string()), channel.now());
        let outcome = engine(&sink)
            .run(&channel, &moderator(), &privileged(), request)
            .await
            .unwrap();

        assert_eq!(outcome.matched, 2);
        assert_eq!(channel.bulk_calls(), vec![vec![first, third]]);
        assert_eq!(channel.remaining(), 2);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].matched_count, 2);
        assert_eq!(records[0].criterion, "containing 'x'");
        assert_eq!(records[0].strategy, "bulk");
    }

    #[tokio::test]
    async fn declined_confirmations_delete_nothing() {
        let channel = FakeChannel::new();
        fill(&channel, 160);
        channel.queue_reply("n");
        let sink = MemorySink::default();

        let request = DeletionRequest::new(channel.id(), 150, Criterion::Everything, channel.now());
        let result = engine(&sink).run(&channel, &moderator(), &privileged(), request).await;

        match result {
            Err(CleanupError::ConfirmationDeclined) => {}
            other => panic!("expected a decline, got {:?}", other),
        }
        assert_eq!(channel.fetch_count(), 0);
        assert_eq!(channel.deletion_calls(), 0);
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn accepted_confirmations_proceed() {
        let channel = FakeChannel::new();
        fill(&channel, 160);
        channel.queue_reply("y");
        let sink = MemorySink::default();

        let request = DeletionRequest::new(channel.id(), 150, Criterion::Everything, channel.now());
        let outcome = engine(&sink)
            .run(&channel, &moderator(), &privileged(), request)
            .await
            .unwrap();

        assert_eq!(outcome.report.removed, 150);
        assert_eq!(channel.remaining(), 10);
    }

    #[tokio::test]
    async fn unbounded_sweeps_confirm_once_the_size_is_known() {
        let channel = FakeChannel::new();
        let anchor = channel.push(ChronoDuration::hours(5), DEFAULT_AUTHOR, "anchor");
        fill(&channel, 120);
        channel.queue_silence();
        let sink = MemorySink::default();

        let request = DeletionRequest::new(channel.id(), 0, Criterion::Everything, channel.now())
            .after(anchor)
            .requiring_bulk();
        let result = engine(&sink).run(&channel, &moderator(), &privileged(), request).await;

        match result {
            Err(CleanupError::ConfirmationTimedOut) => {}
            other => panic!("expected a timeout, got {:?}", other),
        }
        assert!(channel.fetch_count() > 0);
        assert_eq!(channel.deletion_calls(), 0);
        assert_eq!(channel.sent(), vec!["Are you sure you want to delete 120 messages? (y/n)"]);
    }

    #[tokio::test]
    async fn bulk_only_requests_refuse_unprivileged_identities() {
        let channel = FakeChannel::with_ages(&[1, 2]);
        let anchor = channel.ids_newest_first()[1];
        let sink = MemorySink::default();

        let request = DeletionRequest::new(channel.id(), 0, Criterion::Everything, channel.now())
            .after(anchor)
            .requiring_bulk();
        let result = engine(&sink)
            .run(&channel, &moderator(), &bot(Permissions::SEND_MESSAGES), request)
            .await;

        match result {
            Err(CleanupError::InsufficientPrivilege) => {}
            other => panic!("expected insufficient privileges, got {:?}", other),
        }
        assert_eq!(channel.fetch_count(), 0);
        assert_eq!(channel.deletion_calls(), 0);
    }

    #[tokio::test]
    async fn unprivileged_identities_fall_back_to_sequential() {
        let channel = FakeChannel::with_ages(&[1, 2, 3]);
        let sink = MemorySink::default();

        let request = DeletionRequest::new(channel.id(), 3, Criterion::Everything, channel.now());
        let outcome = engine(&sink)
            .run(&channel, &moderator(), &bot(Permissions::empty()), request)
            .await
            .unwrap();

        assert_eq!(outcome.report.executor.name(), "sequential");
        assert!(channel.bulk_calls().is_empty());
        assert_eq!(channel.single_calls().len(), 3);
        assert_eq!(sink.records()[0].strategy, "sequential");
    }

    #[tokio::test]
    async fn partial_failures_are_audited_and_reported() {
        let channel = FakeChannel::new();
        fill(&channel, 90);
        channel.fail_bulk_call(0);
        let sink = MemorySink::default();

        let request = DeletionRequest::new(channel.id(), 90, Criterion::Everything, channel.now());
        let result = engine(&sink).run(&channel, &moderator(), &privileged(), request).await;

        match result {
            Err(CleanupError::PartialDeletionFailure { removed, total }) => {
                assert_eq!(removed, 0);
                assert_eq!(total, 90);
            }
            other => panic!("expected a partial failure, got {:?}", other),
        }
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].removed_count, 0);
        assert_eq!(records[0].matched_count, 90);
    }

    #[tokio::test]
    async fn trailing_messages_are_deleted_with_the_batch() {
        let channel = FakeChannel::with_ages(&[1, 2]);
        let trigger_id = channel.push(ChronoDuration::zero(), BOT, "!cleanup self 2");
        let trigger = crate::cleanup::HistoryMessage {
            id: trigger_id,
            channel_id: channel.id(),
            author_id: BOT,
            content: String::from("!cleanup self 2"),
            created_at: channel.now(),
        };
        let sink = MemorySink::default();

        let request = DeletionRequest::new(channel.id(), 2, Criterion::Everything, channel.now())
            .before(trigger_id)
            .with_trailing(trigger);
        let outcome = engine(&sink)
            .run(&channel, &moderator(), &privileged(), request)
            .await
            .unwrap();

        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.report.removed, 3);
        assert_eq!(channel.remaining(), 0);
    }

    #[tokio::test]
    async fn broken_audit_sinks_do_not_fail_the_cleanup() {
        let channel = FakeChannel::with_ages(&[1]);
        let sink = MemorySink {
            broken: true,
            ..MemorySink::default()
        };

        let request = DeletionRequest::new(channel.id(), 1, Criterion::Everything, channel.now());
        let outcome = engine(&sink)
            .run(&channel, &moderator(), &privileged(), request)
            .await
            .unwrap();

        assert!(!outcome.audited);
        assert_eq!(channel.remaining(), 0);
    }
}
