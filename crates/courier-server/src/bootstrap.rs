//! On-disk bootstrap
//!
//! Creates the data-root layout before the broker materialises anything in
//! memory:
//!
//! ```text
//! <data-root>/
//!   ingress.log
//!   ingress_metadata.log
//!   config.log
//!   topics/topic_{topicId}/
//!     partition_{k}.log
//!     {topicId}_partition_metadata.log
//! ```
//!
//! (`TPC.log` is seeded by the assignment map when the broker opens.)
//!
//! The returned topic list is the effective layout: on a fresh data root it
//! is the configured one (and `config.log` is written from it); on a restart
//! the existing `config.log` wins, so a changed config file cannot silently
//! re-shape partitions that already hold data.

use std::path::Path;

use courier_metadata::{IngressMetadataLog, PartitionMetadataLog, TopicConfigLog, TopicSpec};
use courier_storage::Result;
use tokio::fs;
use tracing::{info, warn};

use crate::config::BrokerConfig;

/// Prepare the on-disk layout and return the effective topic list.
pub async fn bootstrap(config: &BrokerConfig) -> Result<Vec<TopicSpec>> {
    let storage = config.storage();

    if config.reboot && fs::try_exists(&storage.data_root).await? {
        warn!(data_root = %storage.data_root.display(), "reboot requested: clearing data root");
        fs::remove_dir_all(&storage.data_root).await?;
    }

    fs::create_dir_all(storage.topics_dir()).await?;

    let config_log = TopicConfigLog::new(storage.config_log_path());
    let topics = if config_log.exists().await? {
        let existing = config_log.read().await?;
        info!(topics = existing.len(), "topic layout loaded from config.log");
        existing
    } else {
        config_log.write(&config.topics).await?;
        info!(topics = config.topics.len(), "topic layout written to config.log");
        config.topics.clone()
    };

    touch(&storage.ingress_log_path()).await?;
    IngressMetadataLog::new(storage.ingress_metadata_path())
        .load_or_seed()
        .await?;

    for topic in &topics {
        fs::create_dir_all(storage.topic_dir(&topic.id)).await?;

        let metadata = PartitionMetadataLog::new(
            topic.id.clone(),
            storage.partition_metadata_path(&topic.id),
        );
        for partition_id in 0..topic.partitions {
            touch(&storage.partition_log_path(&topic.id, partition_id)).await?;
            metadata.load_or_seed(partition_id).await?;
        }
    }

    info!(
        data_root = %storage.data_root.display(),
        topics = topics.len(),
        "bootstrap complete"
    );
    Ok(topics)
}

/// Create the file if it does not exist, leaving existing contents alone.
async fn touch(path: &Path) -> std::io::Result<()> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map(|_| ())
}
