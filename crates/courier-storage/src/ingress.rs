//! Ingress Buffer
//!
//! Entry point for every accepted message, sitting between the HTTP produce
//! endpoint and the broker's dispatch loop.
//!
//! ## Write path
//!
//! `push` assigns the next WAL offset, stages the record for a batched
//! append, and enqueues the message in memory - all under one lock, before
//! any disk await, so accepted order, offset order and WAL order are the
//! same thing. The staged batch is flushed to `ingress.log` either
//! synchronously (when it reaches `flush_batch_size`) or by a single-shot
//! timer (`flush_interval`) armed on the first staged write.
//!
//! `push` acknowledges before the flush completes; a message is durable only
//! after the next flush tick. A crash in that window loses the staged batch.
//!
//! ## Read path
//!
//! The dispatch loop drains with `batch_extract`, which dequeues in FIFO
//! order and advances the durable `read_offset`. Only messages already
//! covered by a completed flush are handed out - draining past
//! `log_end_offset` would persist a `read_offset` ahead of the WAL, which
//! recovery treats as fatal corruption.
//!
//! ## Flush state machine
//!
//! ```text
//! Idle ──first staged write──► Timed ──timer fires──► Flushing ──► Idle
//!   └──batch threshold on push───────────────────────────►┘
//! ```
//!
//! At most one flush runs at a time. A flush request while one is in flight
//! returns immediately; the in-flight flush re-arms the timer on completion
//! if anything was staged behind it, so no batch can be stranded.

use std::sync::{Arc, Weak};
use std::time::Duration;

use courier_core::{FifoQueue, Message};
use courier_metadata::{Cursor, IngressMetadataLog};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::log::{LogWriter, RecordFormat};

/// A record staged for the next WAL flush. The offset was fixed at `push`
/// time and never changes.
#[derive(Debug)]
struct StagedWrite {
    offset: u64,
    message: Message,
}

#[derive(Debug)]
struct IngressState {
    queue: FifoQueue<Message>,
    pending: Vec<StagedWrite>,
    log_end_offset: u64,
    read_offset: u64,
    is_flushing: bool,
    timer_armed: bool,
}

/// WAL-backed staging buffer between producers and the dispatch loop.
#[derive(Debug)]
pub struct IngressBuffer {
    log: LogWriter,
    metadata: IngressMetadataLog,
    capacity: usize,
    batch_size: usize,
    flush_interval: Duration,
    state: Mutex<IngressState>,
    // Handle for the flush timer task; never keeps the buffer alive.
    weak_self: Weak<IngressBuffer>,
}

impl IngressBuffer {
    /// Open the ingress buffer, recovering any undrained suffix of the WAL
    /// into memory.
    ///
    /// Recovery: load (or seed) the `ingress|logEndOffset|readOffset` cursor
    /// line, then replay the WAL skipping the first `read_offset` records.
    /// Malformed metadata or an unparseable WAL record is fatal.
    pub async fn open(broker_id: &str, config: &StorageConfig) -> Result<Arc<Self>> {
        tokio::fs::create_dir_all(&config.data_root).await?;

        let metadata = IngressMetadataLog::new(config.ingress_metadata_path());
        let cursor = metadata.load_or_seed().await?;

        let log = LogWriter::open(
            config.ingress_log_path(),
            RecordFormat::Ingress {
                broker_id: broker_id.to_string(),
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
            broker = broker_id,
            log_end_offset = cursor.log_end_offset,
            read_offset = cursor.read_offset,
            recovered,
            "ingress buffer ready"
        );

        Ok(Arc::new_cyclic(|weak| Self {
            log,
            metadata,
            capacity: config.max_buffered_messages,
            batch_size: config.flush_batch_size,
            flush_interval: config.flush_interval,
            state: Mutex::new(IngressState {
                queue,
                pending: Vec::new(),
                log_end_offset: cursor.log_end_offset,
                read_offset: cursor.read_offset,
                is_flushing: false,
                timer_armed: false,
            }),
            weak_self: weak.clone(),
        }))
    }

    /// Accept a message.
    ///
    /// The offset is assigned and the message enqueued before this returns,
    /// so the dispatch loop can see it immediately; durability follows at
    /// the next flush. Returns [`Error::BufferFull`] at capacity.
    pub async fn push(&self, message: Message) -> Result<()> {
        let flush_now = {
            let mut state = self.state.lock().await;

            if state.queue.len() >= self.capacity {
                return Err(Error::BufferFull {
                    size: state.queue.len(),
                    capacity: self.capacity,
                });
            }

            // Offsets are assigned here, under the lock and before any
            // await: strictly increasing and contiguous with the WAL even
            // with a flush in flight.
            let offset = state.log_end_offset + state.pending.len() as u64 + 1;
            state.pending.push(StagedWrite {
                offset,
                message: message.clone(),
            });
            state.queue.enqueue(message);

            if state.pending.len() >= self.batch_size {
                true
            } else {
                self.arm_flush_timer(&mut state);
                false
            }
        };

        if flush_now {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush the staged batch to the WAL in a single append, then advance
    /// `log_end_offset` and rewrite the cursor file.
    ///
    /// At most one flush runs at a time; when one is already in flight this
    /// returns immediately. On append failure the captured batch is lost and
    /// no offset advances.
    pub async fn flush(&self) -> Result<()> {
        let batch = {
            let mut state = self.state.lock().await;
            state.timer_armed = false;
            if state.is_flushing || state.pending.is_empty() {
                return Ok(());
            }
            state.is_flushing = true;
            std::mem::take(&mut state.pending)
        };

        let mut buf = String::new();
        for staged in &batch {
            buf.push_str(&self.log.format_record(staged.offset, &staged.message));
        }

        let appended = self.log.append_raw(buf.as_bytes()).await;

        let mut state = self.state.lock().await;
        state.is_flushing = false;

        let result = match appended {
            Ok(()) => {
                if let Some(last) = batch.last() {
                    state.log_end_offset = last.offset;
                }
                let cursor = Cursor {
                    log_end_offset: state.log_end_offset,
                    read_offset: state.read_offset,
                };
                self.metadata.write(cursor).await?;
                debug!(
                    records = batch.len(),
                    log_end_offset = state.log_end_offset,
                    "ingress batch flushed"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    records = batch.len(),
                    error = %e,
                    "ingress batch lost: WAL append failed"
                );
                Err(e)
            }
        };

        // Writes staged while we were flushing must not be stranded.
        if !state.pending.is_empty() {
            self.arm_flush_timer(&mut state);
        }

        result
    }

    /// Schedule a single-shot flush. No-op if a timer is already armed.
    fn arm_flush_timer(&self, state: &mut IngressState) {
        if state.timer_armed {
            return;
        }
        state.timer_armed = true;

        let weak = self.weak_self.clone();
        let delay = self.flush_interval;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(buffer) = weak.upgrade() {
                if let Err(e) = buffer.flush().await {
                    error!(error = %e, "scheduled ingress flush failed");
                }
            }
        });
    }

    /// Drain up to `max` messages in FIFO order, advancing the durable
    /// `read_offset` by the number actually handed out.
    ///
    /// Only flushed messages are eligible: the cursor file must never claim
    /// more drained records than the WAL holds. Returns
    /// [`Error::BufferEmpty`] when nothing eligible is pending.
    pub async fn batch_extract(&self, max: usize) -> Result<Vec<Message>> {
        let mut state = self.state.lock().await;

        let flushed_pending = (state.log_end_offset - state.read_offset) as usize;
        if flushed_pending == 0 {
            return Err(Error::BufferEmpty);
        }

        let batch = state.queue.dequeue_batch(max.min(flushed_pending));
        state.read_offset += batch.len() as u64;

        let cursor = Cursor {
            log_end_offset: state.log_end_offset,
            read_offset: state.read_offset,
        };
        self.metadata.write(cursor).await?;

        debug!(
            drained = batch.len(),
            read_offset = state.read_offset,
            "ingress drained"
        );
        Ok(batch)
    }

    /// Current durable cursor pair.
    pub async fn cursor(&self) -> Cursor {
        let state = self.state.lock().await;
        Cursor {
            log_end_offset: state.log_end_offset,
            read_offset: state.read_offset,
        }
    }

    /// In-memory queue depth (flushed and staged).
    pub async fn len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path, batch_size: usize) -> StorageConfig {
        StorageConfig {
            data_root: dir.to_path_buf(),
            flush_batch_size: batch_size,
            flush_interval: Duration::from_millis(50),
            ..Default::default()
        }
    }

    fn msg(i: usize) -> Message {
        Message::new("orders", format!("m{i}"), format!("payload-{i}"))
    }

    // ---------------------------------------------------------------
    // Push + flush
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_batch_threshold_flushes_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = IngressBuffer::open("b1", &test_config(dir.path(), 2))
            .await
            .unwrap();

        buffer.push(msg(1)).await.unwrap();
        assert_eq!(buffer.cursor().await.log_end_offset, 0);

        buffer.push(msg(2)).await.unwrap();
        let cursor = buffer.cursor().await;
        assert_eq!(cursor.log_end_offset, 2);
        assert_eq!(cursor.read_offset, 0);

        let text = tokio::fs::read_to_string(dir.path().join("ingress.log"))
            .await
            .unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("b1|1|orders|m1|payload-1\n"));
    }

    #[tokio::test]
    async fn test_timer_flushes_partial_batch() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = IngressBuffer::open("b1", &test_config(dir.path(), 1000))
            .await
            .unwrap();

        buffer.push(msg(1)).await.unwrap();
        assert_eq!(buffer.cursor().await.log_end_offset, 0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(buffer.cursor().await.log_end_offset, 1);
    }

    #[tokio::test]
    async fn test_offsets_are_contiguous_across_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = IngressBuffer::open("b1", &test_config(dir.path(), 3))
            .await
            .unwrap();

        for i in 1..=9 {
            buffer.push(msg(i)).await.unwrap();
        }
        assert_eq!(buffer.cursor().await.log_end_offset, 9);

        let text = tokio::fs::read_to_string(dir.path().join("ingress.log"))
            .await
            .unwrap();
        let offsets: Vec<u64> = text
            .lines()
            .map(|l| l.split('|').nth(1).unwrap().parse().unwrap())
            .collect();
        assert_eq!(offsets, (1..=9).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_buffer_full() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            max_buffered_messages: 2,
            ..test_config(dir.path(), 2)
        };
        let buffer = IngressBuffer::open("b1", &config).await.unwrap();

        buffer.push(msg(1)).await.unwrap();
        buffer.push(msg(2)).await.unwrap();
        let err = buffer.push(msg(3)).await;
        assert!(matches!(err, Err(Error::BufferFull { .. })));
    }

    // ---------------------------------------------------------------
    // Drain
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_batch_extract_advances_read_offset() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = IngressBuffer::open("b1", &test_config(dir.path(), 2))
            .await
            .unwrap();

        buffer.push(msg(1)).await.unwrap();
        buffer.push(msg(2)).await.unwrap();

        let batch = buffer.batch_extract(100).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].message_id, "m1");

        let cursor = buffer.cursor().await;
        assert_eq!(cursor.read_offset, 2);
        assert!(buffer.is_empty().await);

        let err = buffer.batch_extract(100).await;
        assert!(matches!(err, Err(Error::BufferEmpty)));
    }

    #[tokio::test]
    async fn test_unflushed_messages_are_not_drained() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = IngressBuffer::open("b1", &test_config(dir.path(), 1000))
            .await
            .unwrap();

        buffer.push(msg(1)).await.unwrap();

        // Staged but not flushed: nothing eligible yet.
        let err = buffer.batch_extract(100).await;
        assert!(matches!(err, Err(Error::BufferEmpty)));

        buffer.flush().await.unwrap();
        let batch = buffer.batch_extract(100).await.unwrap();
        assert_eq!(batch.len(), 1);
    }

    // ---------------------------------------------------------------
    // Recovery
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_recovery_replays_undrained_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 2);

        {
            let buffer = IngressBuffer::open("b1", &config).await.unwrap();
            for i in 1..=4 {
                buffer.push(msg(i)).await.unwrap();
            }
            let drained = buffer.batch_extract(1).await.unwrap();
            assert_eq!(drained[0].message_id, "m1");
        }

        let buffer = IngressBuffer::open("b1", &config).await.unwrap();
        let cursor = buffer.cursor().await;
        assert_eq!(cursor.log_end_offset, 4);
        assert_eq!(cursor.read_offset, 1);
        assert_eq!(buffer.len().await, 3);

        let batch = buffer.batch_extract(100).await.unwrap();
        let ids: Vec<&str> = batch.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_recovery_rejects_corrupt_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 2);
        tokio::fs::write(dir.path().join("ingress_metadata.log"), "ingress|oops|0\n")
            .await
            .unwrap();

        let err = IngressBuffer::open("b1", &config).await;
        assert!(err.is_err());
    }
}
