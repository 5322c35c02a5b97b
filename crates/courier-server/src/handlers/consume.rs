//! Message consume endpoint
//!
//! `batch_extract` on the partition is a peek: nothing is removed until the
//! consumer commits `end_offset` via `/commit`. An empty buffer is a normal
//! 200 with `count: 0`, not an error.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use courier_storage::Error;
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::{ConsumeBatch, ConsumeSingle, DeliveredMessage, Envelope};
use crate::AppState;

/// Messages handed out per batch consume.
const CONSUME_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ConsumeParams {
    /// `b=t` selects batch mode.
    pub b: Option<String>,
}

#[utoipa::path(
    get,
    path = "/consume/{broker_id}/{topic_id}/{partition_id}",
    params(
        ("broker_id" = String, Path, description = "Broker id (single-broker deployments ignore this)"),
        ("topic_id" = String, Path, description = "Topic name"),
        ("partition_id" = u32, Path, description = "Partition to read"),
        ("b" = Option<String>, Query, description = "Set to `t` for batch mode")
    ),
    responses(
        (status = 200, description = "Pending messages (possibly none)", body = ConsumeBatch),
        (status = 404, description = "Unknown topic or partition")
    ),
    tag = "consume"
)]
pub async fn consume(
    State(state): State<AppState>,
    Path((_broker_id, topic_id, partition_id)): Path<(String, String, u32)>,
    Query(params): Query<ConsumeParams>,
) -> Result<Response, ApiError> {
    let topic = state
        .broker
        .topic(&topic_id)
        .ok_or_else(|| ApiError::topic_not_found(&topic_id))?;
    let partition = topic
        .partition(partition_id)
        .ok_or_else(|| ApiError::partition_not_found(&topic_id, partition_id))?;

    let batch_mode = params.b.as_deref() == Some("t");
    let max = if batch_mode { CONSUME_BATCH_SIZE } else { 1 };

    let (messages, start_offset, end_offset) = match partition.batch_extract(max).await {
        Ok(batch) => (batch.messages, batch.start_offset, batch.end_offset),
        Err(Error::BufferEmpty) => {
            let cursor = partition.cursor().await;
            (Vec::new(), cursor.read_offset, cursor.read_offset)
        }
        Err(e) => return Err(e.into()),
    };

    let messages: Vec<DeliveredMessage> = messages.into_iter().map(Into::into).collect();

    let response = if batch_mode {
        Json(Envelope::new(ConsumeBatch {
            count: messages.len(),
            messages,
            start_offset,
            end_offset,
        }))
        .into_response()
    } else {
        Json(Envelope::new(ConsumeSingle {
            message: messages.into_iter().next(),
            start_offset,
            end_offset,
        }))
        .into_response()
    };

    Ok(response)
}
