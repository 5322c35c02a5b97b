//! Courier Metadata
//!
//! This crate implements the broker's durable metadata - the small
//! pipe-delimited log files that let the broker rebuild its cursors and
//! consumer assignments after a restart.
//!
//! ## What lives here
//!
//! - **Offset cursors** (`offsets`): the `logEndOffset`/`readOffset` pair for
//!   the ingress buffer (`ingress_metadata.log`) and for every partition
//!   (one shared `{topic}_partition_metadata.log` per topic).
//! - **Topic config log** (`config_log`): the fixed topic/partition layout
//!   (`config.log`), written once at bootstrap and treated as the source of
//!   truth on restart.
//! - **Consumer assignments** (`assignments`): the topic → partition →
//!   consumer map (`TPC.log`), fully rewritten on every mutation.
//!
//! ## File formats
//!
//! ```text
//! ingress_metadata.log               ingress|logEndOffset|readOffset
//! {topic}_partition_metadata.log     {topic}_partition_{k}|logEndOffset|readOffset
//! config.log                         topic_config|topicId|partitionCount
//! TPC.log                            topicId|partitionId|consumerId
//! ```
//!
//! Malformed lines are fatal at startup: a broker that cannot trust its
//! cursors must not serve traffic.
//!
//! ## Crash safety
//!
//! Every rewrite goes through a temp file followed by an atomic rename, so a
//! crash mid-write leaves the previous version intact. The WALs themselves
//! are append-only and owned by the storage crate; this crate never touches
//! them.

pub mod assignments;
pub mod config_log;
pub mod error;
pub mod offsets;
pub mod types;

mod fsio;

pub use assignments::AssignmentMap;
pub use config_log::TopicConfigLog;
pub use error::{MetadataError, Result};
pub use offsets::{IngressMetadataLog, PartitionMetadataLog};
pub use types::{Cursor, TopicSpec};
