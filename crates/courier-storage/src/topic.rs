//! Topic: a fixed set of partitions plus deterministic routing
//!
//! A `Topic` owns partitions `0..N-1` (N is fixed at creation and never
//! changes at runtime) and routes each message to one of them by hashing its
//! `message_id` ([`courier_core::routing`]). Identical ids always land on
//! the same partition, which is what keeps per-key ordering across restarts.

use std::sync::Arc;

use courier_core::{routing, Message};
use courier_metadata::{PartitionMetadataLog, TopicSpec};

use crate::config::StorageConfig;
use crate::error::Result;
use crate::partition::Partition;

pub struct Topic {
    topic_id: String,
    partitions: Vec<Arc<Partition>>,
}

impl Topic {
    /// Open all partitions of the topic, sharing one metadata file.
    pub async fn open(spec: &TopicSpec, config: &StorageConfig) -> Result<Self> {
        tokio::fs::create_dir_all(config.topic_dir(&spec.id)).await?;

        let metadata = Arc::new(PartitionMetadataLog::new(
            spec.id.clone(),
            config.partition_metadata_path(&spec.id),
        ));

        let mut partitions = Vec::with_capacity(spec.partitions as usize);
        for partition_id in 0..spec.partitions {
            let partition = Partition::open(
                spec.id.clone(),
                partition_id,
                config.partition_log_path(&spec.id, partition_id),
                Arc::clone(&metadata),
                config.max_buffered_messages,
            )
            .await?;
            partitions.push(Arc::new(partition));
        }

        Ok(Self {
            topic_id: spec.id.clone(),
            partitions,
        })
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    pub fn partition_count(&self) -> u32 {
        self.partitions.len() as u32
    }

    /// Push to the partition selected by the message id hash.
    pub async fn push(&self, message: Message) -> Result<()> {
        let index = routing::partition_for(&message.message_id, self.partition_count());
        self.partitions[index as usize].push(message).await
    }

    pub fn partition(&self, partition_id: u32) -> Option<&Arc<Partition>> {
        self.partitions.get(partition_id as usize)
    }
}
