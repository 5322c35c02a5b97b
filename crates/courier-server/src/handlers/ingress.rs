//! Message ingress endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use courier_core::Message;

use crate::error::ApiError;
use crate::models::{Envelope, IngressAck, IngressRequest};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/ingress/{topic_id}",
    params(("topic_id" = String, Path, description = "Topic to publish to")),
    request_body = IngressRequest,
    responses(
        (status = 200, description = "Message accepted", body = IngressAck),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Buffer full or WAL append failed")
    ),
    tag = "produce"
)]
pub async fn ingress(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Json(req): Json<IngressRequest>,
) -> Result<Json<Envelope<IngressAck>>, ApiError> {
    if req.message.message_id.is_empty() {
        return Err(ApiError::bad_request("messageId must not be empty"));
    }

    // Non-string payloads are serialised to their JSON text; the broker only
    // ever sees string content.
    let content = match req.message.content {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };

    let message = Message::new(topic_id.clone(), req.message.message_id.clone(), content);
    state.broker.ingress().push(message).await?;

    tracing::debug!(
        producer = %req.broker_id,
        topic = %topic_id,
        message = %req.message.message_id,
        "message accepted"
    );

    Ok(Json(Envelope::new(IngressAck {
        message_id: req.message.message_id,
        topic_id,
        timestamp: chrono::Utc::now().timestamp_millis(),
    })))
}
