//! HTTP error mapping
//!
//! Translates the core error kinds into status codes and the
//! `{ "success": false, "error": …, "errorCode": … }` envelope:
//!
//! | kind | status | errorCode |
//! |---|---|---|
//! | `BufferFull` | 500 | `BUFFER_FULL` |
//! | `AppendFailed` | 500 | `APPEND_FAILED` |
//! | `InvalidOffset` | 400 | `INVALID_OFFSET` (message carries the current logEndOffset) |
//! | `TopicNotFound` | 404 | `TOPIC_NOT_FOUND` |
//! | partition lookup miss | 404 | `PARTITION_NOT_FOUND` |
//! | `NoPartitionAvailable` | 500 | `NO_PARTITION_AVAILABLE` |
//! | anything else | 500 | `INTERNAL` |
//!
//! `BufferEmpty` never reaches this module: the consume handler turns it
//! into a normal 200 with `count: 0`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use courier_metadata::MetadataError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn topic_not_found(topic_id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "TOPIC_NOT_FOUND",
            format!("topic not found: {topic_id}"),
        )
    }

    pub fn partition_not_found(topic_id: &str, partition_id: u32) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "PARTITION_NOT_FOUND",
            format!("partition not found: {topic_id}/{partition_id}"),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.message,
            "errorCode": self.code,
        }));
        (self.status, body).into_response()
    }
}

impl From<courier_storage::Error> for ApiError {
    fn from(err: courier_storage::Error) -> Self {
        use courier_storage::Error;

        let (status, code) = match &err {
            Error::BufferFull { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "BUFFER_FULL"),
            Error::AppendFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "APPEND_FAILED"),
            Error::InvalidOffset { .. } => (StatusCode::BAD_REQUEST, "INVALID_OFFSET"),
            Error::Metadata(e) => return metadata_error(e),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };
        Self::new(status, code, err.to_string())
    }
}

impl From<MetadataError> for ApiError {
    fn from(err: MetadataError) -> Self {
        metadata_error(&err)
    }
}

fn metadata_error(err: &MetadataError) -> ApiError {
    let (status, code) = match err {
        MetadataError::TopicNotFound(_) => (StatusCode::NOT_FOUND, "TOPIC_NOT_FOUND"),
        MetadataError::NoPartitionAvailable(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "NO_PARTITION_AVAILABLE")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    };
    ApiError::new(status, code, err.to_string())
}
