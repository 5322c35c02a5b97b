//! Message Data Structure
//!
//! This module defines the core `Message` type - the unit of data that flows
//! through the broker.
//!
//! ## Structure
//! Each message carries:
//! - **topic_id**: The topic the producer published to
//! - **message_id**: Producer-supplied, opaque identifier. The broker hashes it
//!   to pick a partition, so the same id always lands on the same partition
//!   within a topic.
//! - **content**: The payload as a string (raw JSON text or an arbitrary
//!   string). Non-string JSON is serialised to a string at the HTTP boundary
//!   before a `Message` is built.
//!
//! ## Example
//! ```ignore
//! let msg = Message::new("orders", "order-7431", r#"{"amount": 99.99}"#);
//! ```

use serde::{Deserialize, Serialize};

/// A single message accepted by the broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Topic the message was published to
    pub topic_id: String,

    /// Producer-supplied identifier, used as the partition routing key
    pub message_id: String,

    /// Payload (raw JSON text or arbitrary string)
    pub content: String,
}

impl Message {
    pub fn new(
        topic_id: impl Into<String>,
        message_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            topic_id: topic_id.into(),
            message_id: message_id.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let msg = Message::new("orders", "m1", "payload");
        assert_eq!(msg.topic_id, "orders");
        assert_eq!(msg.message_id, "m1");
        assert_eq!(msg.content, "payload");
    }

    #[test]
    fn test_content_keeps_raw_json() {
        let msg = Message::new("orders", "m1", r#"{"a":1,"b":[2,3]}"#);
        let parsed: serde_json::Value = serde_json::from_str(&msg.content).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn test_content_may_contain_delimiters() {
        // Payloads are opaque; delimiter handling is the log layer's problem.
        let msg = Message::new("t", "m1", "a|b|c");
        assert_eq!(msg.content, "a|b|c");
    }
}
