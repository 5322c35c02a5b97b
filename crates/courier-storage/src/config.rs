//! Storage configuration and on-disk layout
//!
//! All paths under the data root are derived here so the layout is defined
//! in exactly one place:
//!
//! ```text
//! <data-root>/
//!   ingress.log
//!   ingress_metadata.log
//!   config.log
//!   TPC.log
//!   topics/topic_{topicId}/
//!     partition_{k}.log
//!     {topicId}_partition_metadata.log
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the storage layer.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all broker state.
    pub data_root: PathBuf,

    /// File name of the ingress WAL (under the data root).
    pub ingress_log_file: String,

    /// File name of the ingress cursor file (under the data root).
    pub ingress_metadata_file: String,

    /// Maximum in-memory messages per buffer before `push` rejects. This is
    /// a soft cap against runaway producers, not a sizing knob.
    pub max_buffered_messages: usize,

    /// Staged ingress writes that force a synchronous flush.
    pub flush_batch_size: usize,

    /// Delay before a partially filled staging batch is flushed.
    pub flush_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            ingress_log_file: "ingress.log".to_string(),
            ingress_metadata_file: "ingress_metadata.log".to_string(),
            max_buffered_messages: 200_000_000,
            flush_batch_size: 1000,
            flush_interval: Duration::from_millis(200),
        }
    }
}

impl StorageConfig {
    pub fn ingress_log_path(&self) -> PathBuf {
        self.data_root.join(&self.ingress_log_file)
    }

    pub fn ingress_metadata_path(&self) -> PathBuf {
        self.data_root.join(&self.ingress_metadata_file)
    }

    pub fn config_log_path(&self) -> PathBuf {
        self.data_root.join("config.log")
    }

    pub fn tpc_log_path(&self) -> PathBuf {
        self.data_root.join("TPC.log")
    }

    pub fn topics_dir(&self) -> PathBuf {
        self.data_root.join("topics")
    }

    pub fn topic_dir(&self, topic_id: &str) -> PathBuf {
        self.topics_dir().join(format!("topic_{topic_id}"))
    }

    pub fn partition_log_path(&self, topic_id: &str, partition_id: u32) -> PathBuf {
        self.topic_dir(topic_id)
            .join(format!("partition_{partition_id}.log"))
    }

    pub fn partition_metadata_path(&self, topic_id: &str) -> PathBuf {
        self.topic_dir(topic_id)
            .join(format!("{topic_id}_partition_metadata.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let config = StorageConfig {
            data_root: PathBuf::from("/var/lib/courier"),
            ..Default::default()
        };

        assert_eq!(
            config.ingress_log_path(),
            PathBuf::from("/var/lib/courier/ingress.log")
        );
        assert_eq!(
            config.partition_log_path("orders", 2),
            PathBuf::from("/var/lib/courier/topics/topic_orders/partition_2.log")
        );
        assert_eq!(
            config.partition_metadata_path("orders"),
            PathBuf::from("/var/lib/courier/topics/topic_orders/orders_partition_metadata.log")
        );
    }
}
