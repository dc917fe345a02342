//! HTTP surface
//!
//! One route, `POST /api/recommendations`, backed by a shared read-only
//! [`Recommender`]. Cross-origin access is fully open.

pub mod errors;


use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub use errors::{ApiError, ErrorBody};

use crate::recommend::{RecommendError, RecommendationResult, Recommender};

pub const RECOMMENDATIONS_PATH: &str = "/api/recommendations";

/// Shared state for the server.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}

/// Request payload for the recommendations endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Title to find neighbors for.
    pub query: String,
    /// Client-side search mode. Accepted, currently inert.
    pub search_type: String,
}

/// Build the application router.
#[inline]
pub fn router(recommender: Arc<Recommender>) -> Router {
    Router::new()
        .route(RECOMMENDATIONS_PATH, post(post_recommendations))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { recommender })
}

/// Serve on an already bound listener until ctrl-c.
#[inline]
pub async fn serve(listener: TcpListener, recommender: Arc<Recommender>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(recommender))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Handler for POST /api/recommendations
async fn post_recommendations(
    State(state): State<AppState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationResult>, ApiError> {
    let Json(request) = payload?;
    debug!(
        "Recommendation request: query='{}', search_type='{}'",
        request.query, request.search_type
    );

    let recommender = Arc::clone(&state.recommender);
    let result = tokio::task::spawn_blocking(move || {
        recommender.recommend(&request.query, &request.search_type)
    })
    .await
    .map_err(|e| RecommendError::Internal {
        message: e.to_string(),
    })??;

    Ok(Json(result))
}
