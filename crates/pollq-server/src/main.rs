//! PollQ Server - Long-polling message broker HTTP server
//!
//! This is the main entry point for the PollQ broker.

mod config;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::Parser;
use pollq_core::Broker;
use pollq_types::{
    parse_payload, parse_timeout, validate_queue_name, Error, QueueStats, QueueSummary,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{LogFormat, ServerConfig};

// ==================== App State ====================

/// Shared application state
#[derive(Clone)]
struct AppState {
    broker: Arc<Broker>,
}

// ==================== Request/Response Types ====================

/// Consume query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct ConsumeQuery {
    /// How long to wait for a message, in milliseconds. Missing or
    /// malformed values fall back to the server default.
    #[serde(default)]
    timeout: Option<String>,
}

/// API Error response
#[derive(Debug, Serialize, ToSchema)]
struct ApiErrorBody {
    /// Error message
    error: String,
    /// Error code
    code: String,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    /// Health status
    status: String,
    /// Server version
    version: String,
}

// ==================== Error Handling ====================

/// Wrapper for PollQ errors to implement IntoResponse
struct AppError(Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::InvalidQueueName(_) => (StatusCode::BAD_REQUEST, "INVALID_QUEUE_NAME"),
            Error::QueueNotFound(_) => (StatusCode::NOT_FOUND, "QUEUE_NOT_FOUND"),
            Error::Serialization(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ApiErrorBody {
            error: self.0.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

// ==================== OpenAPI Documentation ====================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PollQ API",
        version = "0.1.0",
        description = "PollQ - In-memory message broker with long-polling consumers",
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        health,
        list_queues,
        queue_stats,
        produce,
        consume,
    ),
    components(
        schemas(
            HealthResponse,
            QueueSummary,
            QueueStats,
            ApiErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "queues", description = "Queue inspection endpoints"),
        (name = "messages", description = "Produce and consume endpoints")
    )
)]
struct ApiDoc;

// ==================== Handlers ====================

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List all queues with their buffered-message counts
#[utoipa::path(
    get,
    path = "/api/queues",
    tag = "queues",
    responses(
        (status = 200, description = "Every queue referenced so far", body = Vec<QueueSummary>)
    )
)]
async fn list_queues(State(state): State<AppState>) -> Json<Vec<QueueSummary>> {
    Json(state.broker.list_queues())
}

/// Get buffered and waiting counts for one queue
#[utoipa::path(
    get,
    path = "/api/queues/{queue}",
    tag = "queues",
    params(
        ("queue" = String, Path, description = "Queue name")
    ),
    responses(
        (status = 200, description = "Queue statistics", body = QueueStats),
        (status = 404, description = "Queue not found", body = ApiErrorBody)
    )
)]
async fn queue_stats(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
) -> Result<Json<QueueStats>, AppError> {
    let stats = state
        .broker
        .queue_stats(&queue_name)
        .ok_or(Error::QueueNotFound(queue_name))?;

    Ok(Json(stats))
}

/// Produce a message
///
/// The body is any JSON value; an empty body is stored as `{}`.
#[utoipa::path(
    post,
    path = "/api/{queue}",
    tag = "messages",
    params(
        ("queue" = String, Path, description = "Queue name")
    ),
    request_body = serde_json::Value,
    responses(
        (status = 204, description = "Message accepted"),
        (status = 400, description = "Body is not valid JSON", body = ApiErrorBody)
    )
)]
async fn produce(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let queue_name = validate_queue_name(&queue_name)?;
    let payload = parse_payload(&body)?;

    state.broker.produce(queue_name, payload);
    Ok(StatusCode::NO_CONTENT)
}

/// Consume a message, long-polling until one arrives or the timeout passes
#[utoipa::path(
    get,
    path = "/api/{queue}",
    tag = "messages",
    params(
        ("queue" = String, Path, description = "Queue name"),
        ConsumeQuery
    ),
    responses(
        (status = 200, description = "Message payload", body = serde_json::Value),
        (status = 204, description = "No message arrived before the timeout")
    )
)]
async fn consume(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
    Query(query): Query<ConsumeQuery>,
) -> Result<Response, AppError> {
    let queue_name = validate_queue_name(&queue_name)?;
    let timeout = parse_timeout(query.timeout.as_deref());

    let outcome = state.broker.consume(queue_name, timeout).await;
    let response = match outcome.into_payload() {
        Some(payload) => Json(payload).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

// ==================== Router ====================

fn create_router(state: AppState) -> Router {
    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Health
        .route("/health", get(health))
        // Queues
        .route("/api/queues", get(list_queues))
        .route("/api/queues/:queue", get(queue_stats))
        // Messages
        .route("/api/:queue", get(consume).post(produce))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ==================== Main ====================

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pollq=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    // Initialize logging
    init_tracing(config.log_format);

    // Create broker
    let broker = Arc::new(Broker::new(config.broker_config()?));

    // Create app state
    let state = AppState { broker };

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    let addr = listener.local_addr()?;

    info!("PollQ server listening on {}", addr);
    info!("Swagger UI: http://{}/swagger-ui/", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
