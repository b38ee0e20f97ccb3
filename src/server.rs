//! HTTP search server.
//!
//! Exposes the similar-ad search pipeline as a JSON HTTP API for the web
//! frontend that renders recommended placements next to a playing video.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search` | Find ads similar to a source video |
//! | `GET`  | `/stats` | Vector index statistics |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "video id must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `index_error` (502), `internal` (500).
//! An empty result list is a success, never an error.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based clients
//! can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::index::VectorIndex;
use crate::models::{IndexStats, RankedPlacement};
use crate::pinecone::PineconeIndex;
use crate::search::{find_similar_ads, SearchParams};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    /// Application configuration (wrapped in `Arc` for cheap cloning across handlers).
    config: Arc<Config>,
    /// The vector index all searches run against.
    index: Arc<dyn VectorIndex>,
}

/// Starts the HTTP search server against the configured Pinecone index.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process receives Ctrl+C or SIGTERM. This is the entry point used by the
/// `ads serve` command.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    init_tracing();
    let index = PineconeIndex::connect(&config.index).await?;
    run_server_with_index(config, Arc::new(index)).await
}

/// Starts the server with an injected [`VectorIndex`] implementation.
///
/// Like [`run_server`], but the caller supplies the index. Used by
/// integration tests to serve against scripted in-memory indexes, and by
/// embedders that manage their own index client.
pub async fn run_server_with_index(
    config: &Config,
    index: Arc<dyn VectorIndex>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        index,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/search", post(handle_search))
        .route("/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    tracing::info!("search server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Installs the fmt subscriber, honoring `RUST_LOG` with an `info` fallback.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 502 Bad Gateway error for failures at the index boundary.
fn index_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "index_error".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 Internal Server Error.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps search cycle failures to HTTP statuses. Validation failures are the
/// caller's fault; anything that failed at or past the index boundary is an
/// upstream error.
fn classify_search_error(err: anyhow::Error) -> AppError {
    let msg = format!("{:#}", err);

    if msg.contains("must not be empty") {
        bad_request(msg)
    } else if msg.contains("Pinecone") || msg.contains("index") {
        index_error(msg)
    } else {
        internal(msg)
    }
}

// ============ POST /search ============

/// JSON request body for `POST /search`.
#[derive(Deserialize)]
struct SearchBody {
    /// Source video identifier, as stored in index metadata.
    #[serde(default)]
    video_id: String,
}

/// JSON response body for `POST /search`.
#[derive(Serialize)]
struct SearchResponse {
    results: Vec<RankedPlacement>,
}

/// Handler for `POST /search`.
///
/// Runs the full search cycle for the given source video and returns the
/// ranked placements. An empty `results` array is the valid "no similar
/// ads" outcome, not an error.
async fn handle_search(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResponse>, AppError> {
    let params = SearchParams::from_config(&state.config);

    let results = match find_similar_ads(state.index.as_ref(), &params, &body.video_id).await {
        Ok(results) => results,
        Err(err) => {
            tracing::warn!(video_id = %body.video_id, "search failed: {:#}", err);
            return Err(classify_search_error(err));
        }
    };

    tracing::info!(
        video_id = %body.video_id,
        placements = results.len(),
        "similar-ad search completed"
    );

    Ok(Json(SearchResponse { results }))
}

// ============ GET /stats ============

/// Handler for `GET /stats`.
///
/// Proxies index statistics so operators can verify connectivity and
/// population without Pinecone credentials of their own.
async fn handle_stats(State(state): State<AppState>) -> Result<Json<IndexStats>, AppError> {
    let stats = state.index.stats().await.map_err(classify_search_error)?;
    Ok(Json(stats))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

/// Handler for `GET /health`.
///
/// Returns a simple health check response with the server status and
/// version. Used by load balancers and the integration test harness.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
