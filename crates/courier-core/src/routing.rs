//! Deterministic Partition Routing
//!
//! Maps a message id to a partition index within a topic. The mapping must be
//! stable across restarts and across implementations: partition WALs on disk
//! were written under this exact function, so changing it would misread old
//! data after a restart.
//!
//! ## Algorithm
//! 1. `SHA-256(message_id)` as a hex string
//! 2. take the first 8 hex characters and parse them as a big-endian u32
//!    (equivalently: the first 4 digest bytes, big-endian)
//! 3. partition index = that integer modulo the partition count

use sha2::{Digest, Sha256};

/// Compute the partition index for a message id.
///
/// `partition_count` must be at least 1; topics are never created with zero
/// partitions.
pub fn partition_for(message_id: &str, partition_count: u32) -> u32 {
    debug_assert!(partition_count >= 1);

    let digest = Sha256::digest(message_id.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    prefix % partition_count
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference form of the hash: first 8 hex characters of the digest,
    /// parsed as an unsigned 32-bit integer.
    fn partition_via_hex(message_id: &str, partition_count: u32) -> u32 {
        let hex = format!("{:x}", Sha256::digest(message_id.as_bytes()));
        let prefix = u32::from_str_radix(&hex[..8], 16).unwrap();
        prefix % partition_count
    }

    #[test]
    fn test_matches_hex_prefix_form() {
        for id in ["", "abc", "msg-0", "msg-999", "order-7431"] {
            for n in [1, 2, 3, 4, 7, 16] {
                assert_eq!(partition_for(id, n), partition_via_hex(id, n), "id={id} n={n}");
            }
        }
    }

    #[test]
    fn test_known_vectors() {
        // sha256("") starts with e3b0c442; sha256("abc") with ba7816bf.
        assert_eq!(partition_for("", 4), 0xe3b0c442u32 % 4);
        assert_eq!(partition_for("abc", 4), 0xba7816bfu32 % 4);
    }

    #[test]
    fn test_deterministic() {
        let a = partition_for("msg-17", 8);
        let b = partition_for("msg-17", 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_within_range() {
        for i in 0..1000 {
            let p = partition_for(&format!("msg-{i}"), 4);
            assert!(p < 4);
        }
    }

    #[test]
    fn test_single_partition_always_zero() {
        for i in 0..100 {
            assert_eq!(partition_for(&format!("msg-{i}"), 1), 0);
        }
    }

    #[test]
    fn test_spreads_across_partitions() {
        // Not a uniformity proof, just a sanity check that every partition of
        // a 4-way topic receives something from 1000 distinct ids.
        let mut counts = [0u32; 4];
        for i in 0..1000 {
            counts[partition_for(&format!("msg-{i}"), 4) as usize] += 1;
        }
        assert!(counts.iter().all(|&c| c > 0), "counts = {counts:?}");
    }
}
