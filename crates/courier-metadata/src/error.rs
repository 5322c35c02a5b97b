//! Metadata Error Types
//!
//! Errors from the metadata layer fall into two groups:
//!
//! - **Structural errors** (`Io`, `MalformedLine`, `OffsetInvariant`): the
//!   on-disk state cannot be trusted. These are fatal at startup.
//! - **Lookup/assignment errors** (`TopicNotFound`, `NoPartitionAvailable`):
//!   normal outcomes of consumer registration, surfaced to the client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetadataError>;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed metadata line in {file}: {line:?}")]
    MalformedLine { file: String, line: String },

    #[error(
        "Offset invariant violated in {file}: logEndOffset {log_end_offset} < readOffset {read_offset}"
    )]
    OffsetInvariant {
        file: String,
        log_end_offset: u64,
        read_offset: u64,
    },

    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("No partition available for topic {0}: all partitions are assigned")]
    NoPartitionAvailable(String),
}
