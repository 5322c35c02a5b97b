//! Consumer registration endpoint

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiError;
use crate::models::{Envelope, RegisterAck, RegisterRequest};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/register/{topic_id}",
    params(("topic_id" = String, Path, description = "Topic to bind a consumer to")),
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Consumer bound to a partition", body = RegisterAck),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Topic not found"),
        (status = 500, description = "No partition available")
    ),
    tag = "consume"
)]
pub async fn register(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Envelope<RegisterAck>>, ApiError> {
    if req.consumer_id.is_empty() {
        return Err(ApiError::bad_request("consumerId must not be empty"));
    }

    let partition_id = state
        .broker
        .register_consumer(&topic_id, &req.consumer_id)
        .await?;

    Ok(Json(Envelope::new(RegisterAck {
        topic_id,
        broker_id: req.broker_id,
        consumer_id: req.consumer_id,
        partition_id,
    })))
}
