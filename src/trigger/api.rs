//! REST API handlers for the trigger server

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::server::AppState;

// ============================================================================
// API Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Body of `POST /api/scrape`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Reply to `POST /api/scrape`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResponse {
    pub fn succeeded(count: usize) -> Self {
        Self {
            success: true,
            count: Some(count),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            count: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/scrape", post(scrape))
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
    }))
}

/// Run the scraper with the requested keywords
async fn scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> impl IntoResponse {
    match state.runner.run(&request.keywords).await {
        Ok(count) => (StatusCode::OK, Json(ScrapeResponse::succeeded(count))),
        Err(e) => {
            tracing::warn!(error = %e, "Scrape request failed");
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(ScrapeResponse::failed(e.to_string())))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
