//! Consumer Assignment Map (TPC)
//!
//! The broker binds consumers to partitions through a process-wide
//! topic → partition → consumer map, persisted to `TPC.log`. One line per
//! `(topic, partition)` pair:
//!
//! ```text
//! topicId|partitionId|consumerId
//! ```
//!
//! An unassigned partition is serialised with a trailing empty field
//! (`orders|1|`). The file is fully rewritten on every mutation; all
//! mutations are serialised behind one lock so the in-memory map and the
//! log never diverge.
//!
//! ## Startup semantics
//!
//! If `TPC.log` exists it is the source of truth and its assignments
//! override the config-derived defaults. Otherwise the map is seeded from
//! the configured topics with every slot unassigned and the log is written
//! out immediately.
//!
//! ## Registration
//!
//! `register` is idempotent: a consumer already bound to a partition of the
//! topic gets the same partition id back. Otherwise it takes the lowest-id
//! free partition. Assignment is monotonic within a process run - nothing
//! unassigns a consumer.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{MetadataError, Result};
use crate::fsio::{read_optional, write_atomic};
use crate::types::TopicSpec;

type TpcMap = BTreeMap<String, BTreeMap<u32, String>>;

/// Topic → partition → consumer map backed by `TPC.log`.
#[derive(Debug)]
pub struct AssignmentMap {
    path: PathBuf,
    inner: Mutex<TpcMap>,
}

impl AssignmentMap {
    /// Load the map from `path`, seeding from `topics` where the log has no
    /// say. A missing log is created from the configured topics with all
    /// partitions unassigned.
    pub async fn load(path: impl Into<PathBuf>, topics: &[TopicSpec]) -> Result<Self> {
        let path = path.into();

        let mut map: TpcMap = TpcMap::new();
        for topic in topics {
            let partitions = (0..topic.partitions).map(|p| (p, String::new())).collect();
            map.insert(topic.id.clone(), partitions);
        }

        match read_optional(&path).await? {
            Some(text) => {
                for line in text.lines().filter(|l| !l.is_empty()) {
                    let parts: Vec<&str> = line.split('|').collect();
                    if parts.len() != 3 {
                        return Err(MetadataError::MalformedLine {
                            file: path.display().to_string(),
                            line: line.to_string(),
                        });
                    }
                    let partition_id: u32 =
                        parts[1].parse().map_err(|_| MetadataError::MalformedLine {
                            file: path.display().to_string(),
                            line: line.to_string(),
                        })?;

                    map.entry(parts[0].to_string())
                        .or_default()
                        .insert(partition_id, parts[2].to_string());
                }
                info!(path = %path.display(), topics = map.len(), "loaded consumer assignments");
            }
            None => {
                write_atomic(&path, &render(&map)).await?;
                info!(path = %path.display(), topics = map.len(), "seeded consumer assignments");
            }
        }

        Ok(Self {
            path,
            inner: Mutex::new(map),
        })
    }

    /// Bind `consumer_id` to a partition of `topic_id`.
    ///
    /// Idempotent for an already-registered consumer; otherwise assigns the
    /// lowest-id unassigned partition and rewrites the log before returning.
    pub async fn register(&self, topic_id: &str, consumer_id: &str) -> Result<u32> {
        let mut map = self.inner.lock().await;

        let partition_id = {
            let partitions = map
                .get_mut(topic_id)
                .ok_or_else(|| MetadataError::TopicNotFound(topic_id.to_string()))?;

            if let Some(existing) = partitions
                .iter()
                .find_map(|(pid, c)| (c == consumer_id).then_some(*pid))
            {
                debug!(
                    topic = topic_id,
                    consumer = consumer_id,
                    partition = existing,
                    "consumer already registered"
                );
                return Ok(existing);
            }

            let free = partitions
                .iter()
                .find_map(|(pid, c)| c.is_empty().then_some(*pid))
                .ok_or_else(|| MetadataError::NoPartitionAvailable(topic_id.to_string()))?;

            partitions.insert(free, consumer_id.to_string());
            free
        };

        write_atomic(&self.path, &render(&map)).await?;
        info!(
            topic = topic_id,
            consumer = consumer_id,
            partition = partition_id,
            "registered consumer"
        );
        Ok(partition_id)
    }

    /// Rewrite the log from the current in-memory map. The commit path calls
    /// this after every successful offset commit.
    pub async fn persist(&self) -> Result<()> {
        let map = self.inner.lock().await;
        write_atomic(&self.path, &render(&map)).await?;
        Ok(())
    }

    /// Snapshot of the configured topics (id + partition count), used to
    /// build the broker's topic map at startup.
    pub async fn topics(&self) -> Vec<TopicSpec> {
        let map = self.inner.lock().await;
        map.iter()
            .map(|(id, partitions)| TopicSpec {
                id: id.clone(),
                partitions: partitions.len() as u32,
            })
            .collect()
    }

    pub async fn contains_topic(&self, topic_id: &str) -> bool {
        self.inner.lock().await.contains_key(topic_id)
    }

    /// Consumer currently bound to `(topic, partition)`, if any.
    pub async fn assigned_consumer(&self, topic_id: &str, partition_id: u32) -> Option<String> {
        let map = self.inner.lock().await;
        map.get(topic_id)
            .and_then(|partitions| partitions.get(&partition_id))
            .filter(|c| !c.is_empty())
            .cloned()
    }
}

fn render(map: &TpcMap) -> String {
    let mut out = String::new();
    for (topic, partitions) in map {
        for (partition_id, consumer) in partitions {
            out.push_str(topic);
            out.push('|');
            out.push_str(&partition_id.to_string());
            out.push('|');
            out.push_str(consumer);
            out.push('\n');
        }
    }
    out
}
