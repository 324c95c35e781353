use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use twilight_model::id::{ChannelId, UserId};
use uuid::Uuid;

use crate::error::AuditError;

/// Who asked for a cleanup.
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
}

/// One finished (or partially finished) cleanup.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor: Actor,
    pub channel: ChannelId,
    pub matched_count: usize,
    pub removed_count: usize,
    pub criterion: String,
    pub strategy: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        actor: Actor,
        channel: ChannelId,
        matched_count: usize,
        removed_count: usize,
        criterion: String,
        strategy: &'static str,
    ) -> Self {
        AuditRecord {
            id: Uuid::new_v4(),
            actor,
            channel,
            matched_count,
            removed_count,
            criterion,
            strategy,
            timestamp: Utc::now(),
        }
    }

    /// The one line summary that goes into the regular logs.
    pub fn summary(&self) -> String {
        format!(
            "{}({}) deleted {} of {} messages {} in channel {}.",
            self.actor.name, self.actor.id, self.removed_count, self.matched_count, self.criterion, self.channel
        )
    }
}

pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Appends every record as a line of json to a file.
///
/// Writes block until the line is synced, on the calling task. A cleanup doesn't return before its
/// record is on disk.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(JsonLinesSink {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonLinesSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().map_err(|_| AuditError::Poisoned)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }
}

/// Writes audit records to the `audit` log target and every configured sink.
///
/// Auditing never undoes a deletion, sink failures are logged and otherwise ignored.
#[derive(Default)]
pub struct AuditLogger {
    sinks: Vec<Box<dyn AuditSink>>,
}

impl AuditLogger {
    pub fn new() -> Self {
        AuditLogger::default()
    }

    pub fn with_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Returns whether every sink accepted the record.
    pub fn record(&self, record: &AuditRecord) -> bool {
        info!(target: "audit", "{}", record.summary());

        let mut stored = true;
        for sink in &self.sinks {
            if let Err(e) = sink.append(record) {
                warn!("Failed to store audit record {}: {}", record.id, e);
                stored = false;
            }
        }
        stored
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemorySink;
    use super::*;
    use std::fs;

    fn record() -> AuditRecord {
        AuditRecord::new(
            Actor {
                id: UserId(10),
                name: String::from("moderator"),
            },
            ChannelId(20),
            12,
            11,
            String::from("containing 'spam'"),
            "bulk",
        )
    }

    #[test]
    fn summaries_name_everything() {
        assert_eq!(
            record().summary(),
            "moderator(10) deleted 11 of 12 messages containing 'spam' in channel 20."
        );
    }

    #[test]
    fn json_lines_append() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonLinesSink::open(dir.path().join("audit.jsonl")).unwrap();

        sink.append(&record()).unwrap();
        sink.append(&record()).unwrap();

        let written = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["matched_count"], 12);
        assert_eq!(parsed["removed_count"], 11);
        assert_eq!(parsed["actor"]["name"], "moderator");
        assert_eq!(parsed["strategy"], "bulk");
    }

    #[test]
    fn broken_sinks_are_reported_but_not_fatal() {
        let working = MemorySink::default();
        let logger = AuditLogger::new()
            .with_sink(MemorySink {
                broken: true,
                ..MemorySink::default()
            })
            .with_sink(working.clone());

        assert!(!logger.record(&record()));
        assert_eq!(working.records().len(), 1);
    }
}
