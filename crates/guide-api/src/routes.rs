//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, a body limit sized for
//! photos and voice clips, and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use guide_core::{GuideConfig, GuideError};

use crate::handlers;
use crate::state::AppState;

/// Largest accepted request body (artifact photos, WAV uploads).
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Only the page served by this process may call the API from a browser.
    let port = state.config.general.port;
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/artifact/analyze", post(handlers::analyze_artifact))
        .route("/chat", post(handlers::chat))
        .route("/voice", post(handlers::voice))
        .route("/facts", post(handlers::facts))
        .route("/log", get(handlers::tour_log))
        .route("/session/reset", post(handlers::reset_session))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured host and port.
pub async fn start_server(config: &GuideConfig, state: AppState) -> Result<(), GuideError> {
    let addr = format!("{}:{}", config.general.host, config.general.port);

    let router = create_router(state);

    tracing::info!("Starting museum guide on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GuideError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| GuideError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
