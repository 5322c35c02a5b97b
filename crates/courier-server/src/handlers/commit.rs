//! Offset commit endpoint
//!
//! Committing `end_offset` from a prior consume makes delivery effective:
//! the committed prefix is reclaimed from memory and the partition's cursor
//! line is rewritten. Re-committing the same offset is a no-op success.

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::models::{CommitAck, CommitRequest, Envelope};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/commit",
    request_body = CommitRequest,
    responses(
        (status = 200, description = "Offset committed", body = CommitAck),
        (status = 400, description = "Invalid offset or request"),
        (status = 404, description = "Unknown topic or partition")
    ),
    tag = "consume"
)]
pub async fn commit(
    State(state): State<AppState>,
    Json(req): Json<CommitRequest>,
) -> Result<Json<Envelope<CommitAck>>, ApiError> {
    let topic = state
        .broker
        .topic(&req.topic_id)
        .ok_or_else(|| ApiError::topic_not_found(&req.topic_id))?;
    let partition = topic
        .partition(req.partition_id)
        .ok_or_else(|| ApiError::partition_not_found(&req.topic_id, req.partition_id))?;

    let outcome = partition.commit_offset(req.offset).await?;

    // Every commit rewrites the assignment log alongside the cursor.
    state.broker.assignments().persist().await?;

    tracing::debug!(
        topic = %req.topic_id,
        partition = req.partition_id,
        consumer = %req.consumer_id,
        offset = req.offset,
        "offset committed"
    );

    Ok(Json(Envelope::new(CommitAck {
        committed: true,
        offset: req.offset,
        topic_id: req.topic_id,
        partition_id: req.partition_id,
        consumer_id: req.consumer_id,
        log_end_offset: outcome.log_end_offset,
        new_read_offset: outcome.new_read_offset,
    })))
}
