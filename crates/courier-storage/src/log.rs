//! Append-Only Log-File Handler
//!
//! Formats a message + offset into a delimited record and appends it to a
//! log file. Two record formats exist, selected at construction:
//!
//! ```text
//! ingress:    brokerId|offset|topicId|messageId|content\n
//! partition:  topicId|partitionId|offset|messageId|content\n
//! ```
//!
//! Records are newline-terminated, fields joined by `|`. Content is always
//! the trailing field and is written verbatim - a `|` inside the payload is
//! not escaped. Replay therefore parses with a bounded split so embedded
//! pipes stay inside the content field. An embedded newline would still
//! split a record; payloads are JSON text in practice, where newlines arrive
//! escaped.
//!
//! The handler never fsyncs per record; durability cadence is the flush
//! policy of the owning buffer. A failed append surfaces as
//! [`Error::AppendFailed`] and the caller must not advance any in-memory
//! offset past it.

use std::path::PathBuf;

use courier_core::Message;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Error, Result};

/// Record format, fixed per log file.
#[derive(Debug, Clone)]
pub enum RecordFormat {
    /// Ingress WAL records: `brokerId|offset|topicId|messageId|content`
    Ingress { broker_id: String },

    /// Partition WAL records: `topicId|partitionId|offset|messageId|content`
    Partition {
        topic_id: String,
        partition_id: u32,
    },
}

impl RecordFormat {
    /// Render one newline-terminated record.
    pub fn format_record(&self, offset: u64, message: &Message) -> String {
        match self {
            RecordFormat::Ingress { broker_id } => format!(
                "{broker_id}|{offset}|{}|{}|{}\n",
                message.topic_id, message.message_id, message.content
            ),
            RecordFormat::Partition {
                topic_id,
                partition_id,
            } => format!(
                "{topic_id}|{partition_id}|{offset}|{}|{}\n",
                message.message_id, message.content
            ),
        }
    }

    /// Parse a record line back into its offset and message. Returns `None`
    /// for a line that does not match the format.
    pub fn parse_record(&self, line: &str) -> Option<(u64, Message)> {
        // splitn keeps embedded pipes inside the trailing content field
        let parts: Vec<&str> = line.splitn(5, '|').collect();
        if parts.len() != 5 {
            return None;
        }

        match self {
            RecordFormat::Ingress { .. } => {
                let offset: u64 = parts[1].parse().ok()?;
                Some((offset, Message::new(parts[2], parts[3], parts[4])))
            }
            RecordFormat::Partition { topic_id, .. } => {
                parts[1].parse::<u32>().ok()?;
                let offset: u64 = parts[2].parse().ok()?;
                Some((offset, Message::new(topic_id.clone(), parts[3], parts[4])))
            }
        }
    }
}

/// Append-only writer over one log file.
#[derive(Debug)]
pub struct LogWriter {
    path: PathBuf,
    format: RecordFormat,
    file: Mutex<File>,
}

impl LogWriter {
    /// Open (or create) the log file in append mode.
    pub async fn open(path: impl Into<PathBuf>, format: RecordFormat) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            format: format.clone(),
            file: Mutex::new(file),
        })
    }

    /// Render one record (used by the ingress buffer to build a batched
    /// append).
    pub fn format_record(&self, offset: u64, message: &Message) -> String {
        self.format.format_record(offset, message)
    }

    /// Format and append a single record.
    pub async fn append_record(&self, offset: u64, message: &Message) -> Result<()> {
        let record = self.format.format_record(offset, message);
        self.append_raw(record.as_bytes()).await
    }

    /// Append a pre-formatted buffer (one or many records) in a single
    /// write.
    pub async fn append_raw(&self, buf: &[u8]) -> Result<()> {
        let mut file = self.file.lock().await;
        file.write_all(buf).await.map_err(Error::AppendFailed)?;
        Ok(())
    }

    /// Replay the log from disk, skipping the first `skip` records and
    /// returning the remaining messages in order. Empty lines are filtered;
    /// anything else that fails to parse aborts the replay.
    pub async fn replay(&self, skip: u64) -> Result<Vec<Message>> {
        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::BufferBuildFailed {
                file: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut messages = Vec::new();
        for line in text
            .lines()
            .filter(|l| !l.is_empty())
            .skip(skip as usize)
        {
            let (_, message) =
                self.format
                    .parse_record(line)
                    .ok_or_else(|| Error::BufferBuildFailed {
                        file: self.path.display().to_string(),
                        reason: format!("unparseable record: {line:?}"),
                    })?;
            messages.push(message);
        }

        info!(
            path = %self.path.display(),
            skipped = skip,
            replayed = messages.len(),
            "log replay complete"
        );
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingress_format() -> RecordFormat {
        RecordFormat::Ingress {
            broker_id: "broker-1".to_string(),
        }
    }

    fn partition_format() -> RecordFormat {
        RecordFormat::Partition {
            topic_id: "orders".to_string(),
            partition_id: 3,
        }
    }

    // ---------------------------------------------------------------
    // Record formats
    // ---------------------------------------------------------------

    #[test]
    fn test_ingress_record_layout() {
        let msg = Message::new("orders", "m1", r#"{"a":1}"#);
        assert_eq!(
            ingress_format().format_record(7, &msg),
            "broker-1|7|orders|m1|{\"a\":1}\n"
        );
    }

    #[test]
    fn test_partition_record_layout() {
        let msg = Message::new("orders", "m1", "payload");
        assert_eq!(
            partition_format().format_record(12, &msg),
            "orders|3|12|m1|payload\n"
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let msg = Message::new("orders", "m1", "payload");
        for format in [ingress_format(), partition_format()] {
            let line = format.format_record(5, &msg);
            let (offset, parsed) = format.parse_record(line.trim_end()).unwrap();
            assert_eq!(offset, 5);
            assert_eq!(parsed, msg);
        }
    }

    #[test]
    fn test_parse_keeps_pipes_in_content() {
        let msg = Message::new("orders", "m1", "a|b|c");
        let line = ingress_format().format_record(1, &msg);
        let (_, parsed) = ingress_format().parse_record(line.trim_end()).unwrap();
        assert_eq!(parsed.content, "a|b|c");
    }

    #[test]
    fn test_parse_rejects_short_line() {
        assert!(ingress_format().parse_record("broker-1|1|orders").is_none());
        assert!(partition_format().parse_record("orders|3|1|m").is_none());
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        assert!(ingress_format()
            .parse_record("broker-1|seven|orders|m1|c")
            .is_none());
        assert!(partition_format().parse_record("orders|x|1|m|c").is_none());
    }

    // ---------------------------------------------------------------
    // Append + replay
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_append_and_replay() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogWriter::open(dir.path().join("partition_0.log"), partition_format())
            .await
            .unwrap();

        log.append_record(1, &Message::new("orders", "m1", "a"))
            .await
            .unwrap();
        log.append_record(2, &Message::new("orders", "m2", "b"))
            .await
            .unwrap();

        let all = log.replay(0).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message_id, "m1");
        assert_eq!(all[1].message_id, "m2");

        let suffix = log.replay(1).await.unwrap();
        assert_eq!(suffix.len(), 1);
        assert_eq!(suffix[0].message_id, "m2");
    }

    #[tokio::test]
    async fn test_replay_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partition_0.log");
        tokio::fs::write(&path, "orders|0|1|m1|a\nnot a record\n")
            .await
            .unwrap();

        let log = LogWriter::open(&path, partition_format()).await.unwrap();
        let err = log.replay(0).await;
        assert!(matches!(err, Err(Error::BufferBuildFailed { .. })));
    }

    #[tokio::test]
    async fn test_batched_raw_append() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogWriter::open(dir.path().join("ingress.log"), ingress_format())
            .await
            .unwrap();

        let mut buf = String::new();
        for i in 1..=3u64 {
            buf.push_str(&log.format_record(i, &Message::new("t", format!("m{i}"), "x")));
        }
        log.append_raw(buf.as_bytes()).await.unwrap();

        let all = log.replay(0).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
