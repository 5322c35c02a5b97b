//! Broker: ingress dispatch loop and consumer registration
//!
//! The `Broker` owns the ingress buffer and the topic map and runs the
//! dispatch loop that moves messages from one to the other:
//!
//! 1. drain up to 100 messages from the ingress buffer,
//! 2. route each to its topic (which hashes the message id to a partition),
//! 3. sleep ~100 ms to yield to the scheduler, then repeat.
//!
//! The loop never aborts on a per-message problem - an unknown topic or a
//! failed partition push is logged and the loop moves on. Only startup
//! errors are fatal.
//!
//! The topic map is built from the assignment map at startup (one topic per
//! TPC entry, partition count = size of its partition map) and is fixed for
//! the life of the process.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courier_metadata::{AssignmentMap, TopicSpec};
use courier_storage::{Error, IngressBuffer, Result, StorageConfig, Topic};
use tracing::{error, info, warn};

/// Messages drained from the ingress buffer per dispatch iteration.
const DISPATCH_BATCH_SIZE: usize = 100;

/// Pause between dispatch iterations (cooperative pacing, also the idle
/// poll interval when the ingress buffer is empty).
const DISPATCH_PAUSE: Duration = Duration::from_millis(100);

pub struct Broker {
    broker_id: String,
    ingress: Arc<IngressBuffer>,
    topics: HashMap<String, Arc<Topic>>,
    assignments: Arc<AssignmentMap>,
}

impl Broker {
    /// Materialise the broker from the on-disk state: assignment map first,
    /// then the ingress buffer and every topic's partitions (each replaying
    /// its WAL suffix).
    pub async fn open(
        broker_id: &str,
        storage: &StorageConfig,
        topics: &[TopicSpec],
    ) -> Result<Arc<Self>> {
        let assignments = Arc::new(AssignmentMap::load(storage.tpc_log_path(), topics).await?);
        let ingress = IngressBuffer::open(broker_id, storage).await?;

        let mut topic_map = HashMap::new();
        for spec in assignments.topics().await {
            let topic = Topic::open(&spec, storage).await?;
            topic_map.insert(spec.id.clone(), Arc::new(topic));
        }

        info!(
            broker = broker_id,
            topics = topic_map.len(),
            "broker state materialised"
        );

        Ok(Arc::new(Self {
            broker_id: broker_id.to_string(),
            ingress,
            topics: topic_map,
            assignments,
        }))
    }

    pub fn broker_id(&self) -> &str {
        &self.broker_id
    }

    pub fn ingress(&self) -> &Arc<IngressBuffer> {
        &self.ingress
    }

    pub fn topic(&self, topic_id: &str) -> Option<&Arc<Topic>> {
        self.topics.get(topic_id)
    }

    pub fn assignments(&self) -> &Arc<AssignmentMap> {
        &self.assignments
    }

    /// Bind a consumer to a partition of `topic_id` (idempotent; see
    /// [`AssignmentMap::register`]).
    pub async fn register_consumer(
        &self,
        topic_id: &str,
        consumer_id: &str,
    ) -> courier_metadata::Result<u32> {
        self.assignments.register(topic_id, consumer_id).await
    }

    /// Spawn the dispatch loop as a background task. The loop runs for the
    /// life of the process.
    pub fn spawn_dispatch_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let broker = Arc::clone(self);
        tokio::spawn(async move {
            info!(broker = %broker.broker_id, "dispatch loop started");
            loop {
                broker.dispatch_once().await;
                tokio::time::sleep(DISPATCH_PAUSE).await;
            }
        })
    }

    /// One dispatch iteration: drain a batch and route it. Per-message
    /// failures are logged, never propagated.
    async fn dispatch_once(&self) {
        let batch = match self.ingress.batch_extract(DISPATCH_BATCH_SIZE).await {
            Ok(batch) => batch,
            Err(Error::BufferEmpty) => return,
            Err(e) => {
                error!(error = %e, "ingress drain failed");
                return;
            }
        };

        for message in batch {
            match self.topics.get(&message.topic_id) {
                Some(topic) => {
                    if let Err(e) = topic.push(message).await {
                        error!(error = %e, "partition push failed; message dropped");
                    }
                }
                None => {
                    warn!(topic = %message.topic_id, message = %message.message_id, "unknown topic; message dropped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{routing, Message};
    use std::time::Duration;

    fn test_storage(dir: &std::path::Path) -> StorageConfig {
        StorageConfig {
            data_root: dir.to_path_buf(),
            flush_batch_size: 2,
            flush_interval: Duration::from_millis(20),
            ..Default::default()
        }
    }

    fn topics() -> Vec<TopicSpec> {
        vec![TopicSpec {
            id: "orders".to_string(),
            partitions: 4,
        }]
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_hashed_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Broker::open("b1", &test_storage(dir.path()), &topics())
            .await
            .unwrap();

        for i in 0..10 {
            broker
                .ingress
                .push(Message::new("orders", format!("msg-{i}"), "x"))
                .await
                .unwrap();
        }
        broker.ingress.flush().await.unwrap();
        broker.dispatch_once().await;

        assert!(broker.ingress.is_empty().await);

        let topic = broker.topic("orders").unwrap();
        let mut routed = 0;
        for partition_id in 0..4 {
            let partition = topic.partition(partition_id).unwrap();
            let backlog = partition.len().await;
            routed += backlog;
            if backlog > 0 {
                let batch = partition.batch_extract(100).await.unwrap();
                for message in &batch.messages {
                    assert_eq!(routing::partition_for(&message.message_id, 4), partition_id);
                }
            }
        }
        assert_eq!(routed, 10);
    }

    #[tokio::test]
    async fn test_unknown_topic_is_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Broker::open("b1", &test_storage(dir.path()), &topics())
            .await
            .unwrap();

        broker
            .ingress
            .push(Message::new("ghost-topic", "m1", "x"))
            .await
            .unwrap();
        broker
            .ingress
            .push(Message::new("orders", "m2", "x"))
            .await
            .unwrap();
        broker.dispatch_once().await;

        // The routable message still arrived.
        let topic = broker.topic("orders").unwrap();
        let target = routing::partition_for("m2", 4);
        assert_eq!(topic.partition(target).unwrap().len().await, 1);
    }

    #[tokio::test]
    async fn test_background_loop_drains_ingress() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Broker::open("b1", &test_storage(dir.path()), &topics())
            .await
            .unwrap();
        let handle = broker.spawn_dispatch_loop();

        for i in 0..6 {
            broker
                .ingress
                .push(Message::new("orders", format!("msg-{i}"), "x"))
                .await
                .unwrap();
        }

        // flush (20 ms timer) + one dispatch tick (100 ms pause)
        let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
        loop {
            if broker.ingress.is_empty().await {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "loop never drained");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        handle.abort();
    }

    #[tokio::test]
    async fn test_register_consumer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Broker::open("b1", &test_storage(dir.path()), &topics())
            .await
            .unwrap();

        let p1 = broker.register_consumer("orders", "c1").await.unwrap();
        let again = broker.register_consumer("orders", "c1").await.unwrap();
        assert_eq!(p1, again);

        let err = broker.register_consumer("ghost", "c1").await;
        assert!(err.is_err());
    }
}
