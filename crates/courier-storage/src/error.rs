//! Storage Error Types
//!
//! ## Error Categories
//!
//! ### Buffer errors
//! - `BufferFull`: the in-memory queue hit its configured cap; the producer
//!   should retry later.
//! - `BufferEmpty`: nothing pending. Reported to the dispatch loop and the
//!   consume path; callers treat it as a normal empty batch, not a failure.
//!
//! ### Durability errors
//! - `AppendFailed`: the WAL append itself failed. Offsets must not advance
//!   past a failed append.
//! - `BufferBuildFailed`: WAL replay failed at startup. Fatal - the broker
//!   cannot trust its recovered state.
//!
//! ### Consumer errors
//! - `InvalidOffset`: a commit past `log_end_offset`.
//!
//! All storage operations return `Result<T>` aliased to `Result<T, Error>`
//! for clean `?` propagation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("buffer full: {size} buffered messages (capacity {capacity})")]
    BufferFull { size: usize, capacity: usize },

    #[error("buffer empty")]
    BufferEmpty,

    #[error("WAL append failed: {0}")]
    AppendFailed(#[source] std::io::Error),

    #[error("WAL replay failed for {file}: {reason}")]
    BufferBuildFailed { file: String, reason: String },

    #[error("invalid offset {requested}: logEndOffset is {log_end_offset}")]
    InvalidOffset { requested: u64, log_end_offset: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Metadata(#[from] courier_metadata::MetadataError),
}
