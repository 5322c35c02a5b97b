//! Shared metadata types

use serde::{Deserialize, Serialize};

/// Static configuration for one topic: its id and the fixed number of
/// partitions. The partition count never changes at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub id: String,
    pub partitions: u32,
}

/// A durable offset cursor pair.
///
/// Offsets are 1-based: `log_end_offset` is the index of the last record
/// written to the WAL (0 when empty), `read_offset` the index of the last
/// record drained (ingress) or committed (partition). The invariant
/// `log_end_offset >= read_offset` holds at all times; both only move
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub log_end_offset: u64,
    pub read_offset: u64,
}

impl Cursor {
    /// Messages written but not yet drained/committed.
    pub fn pending(&self) -> u64 {
        self.log_end_offset - self.read_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_pending() {
        let c = Cursor {
            log_end_offset: 10,
            read_offset: 4,
        };
        assert_eq!(c.pending(), 6);
        assert_eq!(Cursor::default().pending(), 0);
    }
}
