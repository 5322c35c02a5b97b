//! Courier HTTP server
//!
//! Thin HTTP/JSON surface over the broker core. The handlers translate
//! between the wire envelope and the core's tagged results; everything with
//! behaviour lives below this crate's `broker` module and in
//! `courier-storage`.
//!
//! ## Endpoints
//!
//! - `POST /ingress/{topic_id}` - accept a message for a topic
//! - `POST /register/{topic_id}` - bind a consumer to a partition
//! - `GET /consume/{broker_id}/{topic_id}/{partition_id}?b=t` - read pending
//!   messages (peek; nothing is removed until commit)
//! - `POST /commit` - commit a consumer offset
//! - `GET /health` - liveness
//!
//! Swagger UI is served at `/swagger-ui`.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod bootstrap;
pub mod broker;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

pub use bootstrap::bootstrap;
pub use broker::Broker;
pub use config::BrokerConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let swagger = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/ingress/:topic_id", post(handlers::ingress::ingress))
        .route("/register/:topic_id", post(handlers::register::register))
        .route(
            "/consume/:broker_id/:topic_id/:partition_id",
            get(handlers::consume::consume),
        )
        .route("/commit", post(handlers::commit::commit))
        .route("/health", get(handlers::health::health_check))
        .merge(swagger)
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Start the API server, running until `shutdown` resolves.
pub async fn serve(
    router: Router,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Courier API listening on {}", addr);
    tracing::info!("   Swagger UI: http://localhost:{}/swagger-ui", port);
    tracing::info!("   Health: http://localhost:{}/health", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::ingress::ingress,
        handlers::register::register,
        handlers::consume::consume,
        handlers::commit::commit,
        handlers::health::health_check,
    ),
    components(schemas(
        models::IngressRequest,
        models::IngressMessage,
        models::IngressAck,
        models::RegisterRequest,
        models::RegisterAck,
        models::DeliveredMessage,
        models::ConsumeBatch,
        models::ConsumeSingle,
        models::CommitRequest,
        models::CommitAck,
        models::HealthResponse,
    )),
    tags(
        (name = "produce", description = "Message ingress"),
        (name = "consume", description = "Consumer registration, consumption and commits"),
        (name = "health", description = "Health checks"),
    ),
    info(
        title = "Courier API",
        version = "0.1.0",
        description = "HTTP API for Courier - a single-node durable topic-partitioned message broker",
    )
)]
struct ApiDoc;
