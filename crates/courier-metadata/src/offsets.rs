//! Offset Cursor Logs
//!
//! Two small pipe-delimited files track how far the broker has written and
//! how far its readers have progressed:
//!
//! - `ingress_metadata.log` holds a single line `ingress|logEndOffset|readOffset`
//!   for the ingress buffer.
//! - `{topic}_partition_metadata.log` holds one line per partition of the
//!   topic, `{topic}_partition_{k}|logEndOffset|readOffset`. The file is
//!   shared by all partitions of the topic, so updates are serialised and
//!   rewrite only the matching line (missing lines are appended).
//!
//! Both loaders seed missing files with zeroed cursors and reject anything
//! they cannot parse: a malformed cursor file means replay would start from
//! the wrong place, which is fatal.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::info;

use crate::error::{MetadataError, Result};
use crate::fsio::{read_optional, write_atomic};
use crate::types::Cursor;

/// Literal leading token of the ingress metadata line.
const INGRESS_KEY: &str = "ingress";

fn malformed(file: &Path, line: &str) -> MetadataError {
    MetadataError::MalformedLine {
        file: file.display().to_string(),
        line: line.to_string(),
    }
}

/// Parse `key|logEndOffset|readOffset`, checking the key and the offset
/// invariant.
fn parse_cursor_line(file: &Path, line: &str, expected_key: &str) -> Result<Cursor> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() != 3 || parts[0] != expected_key {
        return Err(malformed(file, line));
    }

    let log_end_offset: u64 = parts[1].parse().map_err(|_| malformed(file, line))?;
    let read_offset: u64 = parts[2].parse().map_err(|_| malformed(file, line))?;

    if log_end_offset < read_offset {
        return Err(MetadataError::OffsetInvariant {
            file: file.display().to_string(),
            log_end_offset,
            read_offset,
        });
    }

    Ok(Cursor {
        log_end_offset,
        read_offset,
    })
}

/// Cursor file for the ingress buffer (`ingress|logEndOffset|readOffset`).
#[derive(Debug)]
pub struct IngressMetadataLog {
    path: PathBuf,
}

impl IngressMetadataLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the cursor, seeding the file with `ingress|0|0` if it does not
    /// exist yet.
    pub async fn load_or_seed(&self) -> Result<Cursor> {
        match read_optional(&self.path).await? {
            Some(text) => {
                let line = text.lines().next().unwrap_or("");
                parse_cursor_line(&self.path, line, INGRESS_KEY)
            }
            None => {
                let cursor = Cursor::default();
                self.write(cursor).await?;
                info!(path = %self.path.display(), "seeded ingress metadata");
                Ok(cursor)
            }
        }
    }

    /// Rewrite the cursor line.
    pub async fn write(&self, cursor: Cursor) -> Result<()> {
        let line = format!(
            "{INGRESS_KEY}|{}|{}\n",
            cursor.log_end_offset, cursor.read_offset
        );
        write_atomic(&self.path, &line).await?;
        Ok(())
    }
}

/// Cursor file shared by all partitions of one topic.
#[derive(Debug)]
pub struct PartitionMetadataLog {
    topic_id: String,
    path: PathBuf,
    // Serialises rewrites: partitions of the same topic share this file.
    io_lock: Mutex<()>,
}

impl PartitionMetadataLog {
    pub fn new(topic_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            topic_id: topic_id.into(),
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    fn entry_key(&self, partition_id: u32) -> String {
        format!("{}_partition_{}", self.topic_id, partition_id)
    }

    /// Load one partition's cursor, appending a zeroed line if the partition
    /// has no entry yet. Every line in the file is structurally validated;
    /// a malformed line anywhere is fatal.
    pub async fn load_or_seed(&self, partition_id: u32) -> Result<Cursor> {
        let _guard = self.io_lock.lock().await;

        let key = self.entry_key(partition_id);
        let text = read_optional(&self.path).await?.unwrap_or_default();

        let mut found = None;
        for line in text.lines().filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() != 3
                || parts[1].parse::<u64>().is_err()
                || parts[2].parse::<u64>().is_err()
            {
                return Err(malformed(&self.path, line));
            }
            if parts[0] == key {
                found = Some(parse_cursor_line(&self.path, line, &key)?);
            }
        }

        match found {
            Some(cursor) => Ok(cursor),
            None => {
                let mut contents = text;
                contents.push_str(&format!("{key}|0|0\n"));
                write_atomic(&self.path, &contents).await?;
                info!(
                    topic = %self.topic_id,
                    partition = partition_id,
                    "seeded partition metadata line"
                );
                Ok(Cursor::default())
            }
        }
    }

    /// Rewrite only this partition's line; all other lines are preserved
    /// verbatim. A missing line is appended.
    pub async fn update(&self, partition_id: u32, cursor: Cursor) -> Result<()> {
        let _guard = self.io_lock.lock().await;

        let key = self.entry_key(partition_id);
        let entry = format!("{key}|{}|{}", cursor.log_end_offset, cursor.read_offset);

        let text = read_optional(&self.path).await?.unwrap_or_default();
        let mut lines: Vec<String> = Vec::new();
        let mut replaced = false;

        for line in text.lines().filter(|l| !l.is_empty()) {
            if line.split('|').next() == Some(key.as_str()) {
                lines.push(entry.clone());
                replaced = true;
            } else {
                lines.push(line.to_string());
            }
        }
        if !replaced {
            lines.push(entry);
        }

        let mut contents = lines.join("\n");
        contents.push('\n');
        write_atomic(&self.path, &contents).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::fs;

    // ---------------------------------------------------------------
    // Ingress metadata
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_ingress_seeds_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = IngressMetadataLog::new(dir.path().join("ingress_metadata.log"));

        let cursor = log.load_or_seed().await.unwrap();
        assert_eq!(cursor, Cursor::default());

        let text = fs::read_to_string(dir.path().join("ingress_metadata.log"))
            .await
            .unwrap();
        assert_eq!(text, "ingress|0|0\n");
    }

    #[tokio::test]
    async fn test_ingress_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let log = IngressMetadataLog::new(dir.path().join("ingress_metadata.log"));

        log.write(Cursor {
            log_end_offset: 42,
            read_offset: 17,
        })
        .await
        .unwrap();

        let cursor = log.load_or_seed().await.unwrap();
        assert_eq!(cursor.log_end_offset, 42);
        assert_eq!(cursor.read_offset, 17);
    }

    #[tokio::test]
    async fn test_ingress_rejects_wrong_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingress_metadata.log");
        fs::write(&path, "egress|1|0\n").await.unwrap();

        let err = IngressMetadataLog::new(&path).load_or_seed().await;
        assert!(matches!(err, Err(MetadataError::MalformedLine { .. })));
    }

    #[tokio::test]
    async fn test_ingress_rejects_wrong_field_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingress_metadata.log");
        fs::write(&path, "ingress|1\n").await.unwrap();

        let err = IngressMetadataLog::new(&path).load_or_seed().await;
        assert!(matches!(err, Err(MetadataError::MalformedLine { .. })));
    }

    #[tokio::test]
    async fn test_ingress_rejects_offset_inversion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingress_metadata.log");
        fs::write(&path, "ingress|3|9\n").await.unwrap();

        let err = IngressMetadataLog::new(&path).load_or_seed().await;
        assert!(matches!(err, Err(MetadataError::OffsetInvariant { .. })));
    }

    // ---------------------------------------------------------------
    // Partition metadata
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_partition_seeds_lines_independently() {
        let dir = tempfile::tempdir().unwrap();
        let log = PartitionMetadataLog::new("orders", dir.path().join("meta.log"));

        assert_eq!(log.load_or_seed(0).await.unwrap(), Cursor::default());
        assert_eq!(log.load_or_seed(1).await.unwrap(), Cursor::default());

        let text = fs::read_to_string(dir.path().join("meta.log")).await.unwrap();
        assert_eq!(text, "orders_partition_0|0|0\norders_partition_1|0|0\n");
    }

    #[tokio::test]
    async fn test_partition_update_targets_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = PartitionMetadataLog::new("orders", dir.path().join("meta.log"));
        log.load_or_seed(0).await.unwrap();
        log.load_or_seed(1).await.unwrap();

        log.update(
            1,
            Cursor {
                log_end_offset: 5,
                read_offset: 2,
            },
        )
        .await
        .unwrap();

        let text = fs::read_to_string(dir.path().join("meta.log")).await.unwrap();
        assert_eq!(text, "orders_partition_0|0|0\norders_partition_1|5|2\n");

        assert_eq!(log.load_or_seed(0).await.unwrap(), Cursor::default());
        let p1 = log.load_or_seed(1).await.unwrap();
        assert_eq!(p1.log_end_offset, 5);
        assert_eq!(p1.read_offset, 2);
    }

    #[tokio::test]
    async fn test_partition_update_appends_missing_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = PartitionMetadataLog::new("orders", dir.path().join("meta.log"));

        log.update(
            3,
            Cursor {
                log_end_offset: 7,
                read_offset: 7,
            },
        )
        .await
        .unwrap();

        let text = fs::read_to_string(dir.path().join("meta.log")).await.unwrap();
        assert_eq!(text, "orders_partition_3|7|7\n");
    }

    #[tokio::test]
    async fn test_partition_malformed_line_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.log");
        fs::write(&path, "orders_partition_0|0|0\ngarbage line\n")
            .await
            .unwrap();

        let log = PartitionMetadataLog::new("orders", &path);
        let err = log.load_or_seed(0).await;
        assert!(matches!(err, Err(MetadataError::MalformedLine { .. })));
    }

    #[tokio::test]
    async fn test_partition_offset_inversion_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.log");
        fs::write(&path, "orders_partition_0|2|6\n").await.unwrap();

        let log = PartitionMetadataLog::new("orders", &path);
        let err = log.load_or_seed(0).await;
        assert!(matches!(err, Err(MetadataError::OffsetInvariant { .. })));
    }
}
