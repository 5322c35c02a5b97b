//! Partition Buffer
//!
//! One `Partition` per `(topic, partition)` pair: an append-only WAL, an
//! in-memory FIFO of the uncommitted suffix, and a durable cursor line in
//! the topic's shared metadata file.
//!
//! ## Consumption model
//!
//! `batch_extract` only *peeks* - the messages stay queued until the
//! consumer comes back with `commit_offset(end_offset)`. A consumer that
//! crashes between extract and commit simply sees the same batch again,
//! which is exactly the at-least-once contract.
//!
//! ## Ordering
//!
//! `push` is strictly ordered: WAL append first, and only on success the
//! enqueue, the `log_end_offset` advance, and the metadata rewrite. A failed
//! append leaves the partition untouched.
//!
//! ## Offset state machine
//!
//! States are `(L, R)` with `L >= R >= 0`:
//! - `push`: `(L, R) → (L+1, R)` on durable append
//! - `commit(o)` with `R <= o <= L`: `(L, R) → (L, o)`
//!
//! `commit(o)` with `o <= R` is a no-op success (re-commits are idempotent,
//! the cursor never moves backwards); `o > L` is `InvalidOffset`.

use std::path::PathBuf;
use std::sync::Arc;

use courier_core::{FifoQueue, Message};
use courier_metadata::{Cursor, PartitionMetadataLog};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::log::{LogWriter, RecordFormat};

/// Result of a `batch_extract`: the peeked messages plus the offset window
/// the consumer must commit to make removal effective.
#[derive(Debug, Clone)]
pub struct BatchExtract {
    pub messages: Vec<Message>,
    pub start_offset: u64,
    pub end_offset: u64,
}

/// Result of a successful `commit_offset`.
#[derive(Debug, Clone, Copy)]
pub struct CommitOutcome {
    pub log_end_offset: u64,
    pub new_read_offset: u64,
}

#[derive(Debug)]
struct PartitionState {
    queue: FifoQueue<Message>,
    log_end_offset: u64,
    read_offset: u64,
}

/// A single partition's WAL-backed buffer.
#[derive(Debug)]
pub struct Partition {
    topic_id: String,
    partition_id: u32,
    capacity: usize,
    log: LogWriter,
    metadata: Arc<PartitionMetadataLog>,
    state: Mutex<PartitionState>,
}

impl Partition {
    /// Open the partition, replaying the uncommitted WAL suffix into memory.
    ///
    /// Recovery mirrors the ingress buffer: load (or seed) this partition's
    /// cursor line, require `log_end_offset >= read_offset`, then replay the
    /// WAL from record `read_offset` to the end. After recovery the buffer
    /// holds exactly the uncommitted suffix, so consume-then-commit behaves
    /// as if the process had never restarted.
    pub async fn open(
        topic_id: String,
        partition_id: u32,
        log_path: PathBuf,
        metadata: Arc<PartitionMetadataLog>,
        capacity: usize,
    ) -> Result<Self> {
        let cursor = metadata.load_or_seed(partition_id).await?;

        let log = LogWriter::open(
            log_path,
            RecordFormat::Partition {
                topic_id: topic_id.clone(),
                partition_id,
            },
        )
        .await?;

        let replayed = log.replay(cursor.read_offset).await?;
        let mut queue = FifoQueue::new();
        let recovered = replayed.len();
        for message in replayed {
            queue.enqueue(message);
        }

        info!(
            topic = %topic_id,
            partition = partition_id,
            log_end_offset = cursor.log_end_offset,
            read_offset = cursor.read_offset,
            recovered,
            "partition ready"
        );

        Ok(Self {
            topic_id,
            partition_id,
            capacity,
            log,
            metadata,
            state: Mutex::new(PartitionState {
                queue,
                log_end_offset: cursor.log_end_offset,
                read_offset: cursor.read_offset,
            }),
        })
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    pub fn partition_id(&self) -> u32 {
        self.partition_id
    }

    /// Append a message durably and enqueue it for consumption.
    pub async fn push(&self, message: Message) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.queue.len() >= self.capacity {
            return Err(Error::BufferFull {
                size: state.queue.len(),
                capacity: self.capacity,
            });
        }

        // WAL first; nothing advances past a failed append.
        let offset = state.log_end_offset + 1;
        self.log.append_record(offset, &message).await?;

        state.queue.enqueue(message);
        state.log_end_offset = offset;

        self.metadata
            .update(
                self.partition_id,
                Cursor {
                    log_end_offset: state.log_end_offset,
                    read_offset: state.read_offset,
                },
            )
            .await?;

        debug!(
            topic = %self.topic_id,
            partition = self.partition_id,
            offset,
            "message appended"
        );
        Ok(())
    }

    /// Peek the next up to `max` messages without removing them.
    ///
    /// `start_offset` is the current `read_offset`; the consumer commits
    /// `end_offset` to take delivery. Returns [`Error::BufferEmpty`] when
    /// nothing is pending.
    pub async fn batch_extract(&self, max: usize) -> Result<BatchExtract> {
        let state = self.state.lock().await;

        if state.queue.is_empty() {
            return Err(Error::BufferEmpty);
        }

        let messages = state.queue.peek_batch(max);
        let start_offset = state.read_offset;
        let end_offset = start_offset + messages.len() as u64;

        Ok(BatchExtract {
            messages,
            start_offset,
            end_offset,
        })
    }

    /// Commit consumption up to `offset`, reclaiming the committed prefix
    /// from memory and persisting the new cursor.
    ///
    /// Committing at or below the current `read_offset` is a successful
    /// no-op. Committing past `log_end_offset` is rejected with
    /// [`Error::InvalidOffset`] and changes nothing.
    pub async fn commit_offset(&self, offset: u64) -> Result<CommitOutcome> {
        let mut state = self.state.lock().await;

        if offset > state.log_end_offset {
            return Err(Error::InvalidOffset {
                requested: offset,
                log_end_offset: state.log_end_offset,
            });
        }

        if offset > state.read_offset {
            let reclaim = (offset - state.read_offset) as usize;
            state.queue.dequeue_batch(reclaim);
            state.read_offset = offset;

            self.metadata
                .update(
                    self.partition_id,
                    Cursor {
                        log_end_offset: state.log_end_offset,
                        read_offset: state.read_offset,
                    },
                )
                .await?;

            debug!(
                topic = %self.topic_id,
                partition = self.partition_id,
                read_offset = offset,
                reclaimed = reclaim,
                "offset committed"
            );
        }

        Ok(CommitOutcome {
            log_end_offset: state.log_end_offset,
            new_read_offset: state.read_offset,
        })
    }

    /// Current durable cursor pair.
    pub async fn cursor(&self) -> Cursor {
        let state = self.state.lock().await;
        Cursor {
            log_end_offset: state.log_end_offset,
            read_offset: state.read_offset,
        }
    }

    /// In-memory uncommitted backlog.
    pub async fn len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.queue.is_empty()
    }
}
