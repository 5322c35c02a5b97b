//! API models for the HTTP endpoints
//!
//! Every successful response is wrapped in the `{ "success": true, "data": … }`
//! envelope; failures are rendered by [`crate::error::ApiError`] as
//! `{ "success": false, "error": …, "errorCode": … }`.

use courier_core::Message;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Success envelope around every response payload.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressRequest {
    pub broker_id: String,
    pub message: IngressMessage,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressMessage {
    pub message_id: String,
    /// Raw JSON payload; non-string values are serialised to a string before
    /// entering the broker.
    #[schema(value_type = Object)]
    pub content: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressAck {
    pub message_id: String,
    pub topic_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub broker_id: String,
    pub consumer_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAck {
    pub topic_id: String,
    pub broker_id: String,
    pub consumer_id: String,
    pub partition_id: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredMessage {
    pub message_id: String,
    pub topic_id: String,
    pub content: String,
}

impl From<Message> for DeliveredMessage {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.message_id,
            topic_id: message.topic_id,
            content: message.content,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeBatch {
    pub messages: Vec<DeliveredMessage>,
    pub count: usize,
    pub start_offset: u64,
    pub end_offset: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeSingle {
    pub message: Option<DeliveredMessage>,
    pub start_offset: u64,
    pub end_offset: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub broker_id: String,
    pub topic_id: String,
    pub partition_id: u32,
    pub consumer_id: String,
    pub offset: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitAck {
    pub committed: bool,
    pub offset: u64,
    pub topic_id: String,
    pub partition_id: u32,
    pub consumer_id: String,
    pub log_end_offset: u64,
    pub new_read_offset: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
