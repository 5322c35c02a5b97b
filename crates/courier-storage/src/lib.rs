//! Courier Storage Layer
//!
//! This crate implements the broker's durable message path: every accepted
//! message is appended to a write-ahead log before the broker acknowledges
//! it, and the in-memory buffers are rebuilt from those logs after a crash.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────┐
//! │ Producers │
//! └─────┬─────┘
//!       │ push
//!       ▼
//! ┌────────────────┐   staged batch   ┌──────────────┐
//! │ IngressBuffer  │ ───────────────► │ ingress.log  │
//! │ (queue+cursor) │                  └──────────────┘
//! └───────┬────────┘
//!         │ broker loop drains
//!         ▼
//! ┌────────────────┐  route by id  ┌────────────────┐   append   ┌─────────────────┐
//! │     Topic      │ ────────────► │   Partition    │ ─────────► │ partition_k.log │
//! └────────────────┘               │ (queue+cursor) │            └─────────────────┘
//!                                  └───────┬────────┘
//!                                          │ peek / commit
//!                                          ▼
//!                                     Consumers
//! ```
//!
//! ## Main Components
//!
//! - [`log`]: the append-only log-file handler and the two pipe-delimited
//!   record formats (ingress and partition).
//! - [`ingress`]: the staging buffer between the HTTP producer endpoint and
//!   the dispatch loop. Writes are staged and flushed to the ingress WAL in
//!   batches (size- or timer-triggered).
//! - [`partition`]: per-`(topic, partition)` buffer with peek/commit
//!   consumption. `batch_extract` never removes; only `commit_offset` does,
//!   which is what makes delivery at-least-once.
//! - [`topic`]: a fixed set of partitions plus deterministic routing on the
//!   message id.
//!
//! ## Offset model
//!
//! Every buffer tracks two 1-based cursors: `log_end_offset` (last record in
//! the WAL) and `read_offset` (last record drained or committed). The
//! difference is the pending backlog; `log_end_offset >= read_offset` is a
//! hard invariant, checked fatally at startup.

pub mod config;
pub mod error;
pub mod ingress;
pub mod log;
pub mod partition;
pub mod topic;

pub use config::StorageConfig;
pub use error::{Error, Result};
pub use ingress::IngressBuffer;
pub use log::{LogWriter, RecordFormat};
pub use partition::{BatchExtract, CommitOutcome, Partition};
pub use topic::Topic;
