use anyhow::Result;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use jobrec_core::persist::load_index;
use jobrec_core::{recommend, IndexHeader, JobIndex, JobPosting, Recommendation, VectorizerConfig};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod errors;

use errors::ApiError;

const MAX_TOP_N: usize = 100;

#[derive(Deserialize)]
pub struct RecommendParams {
    pub q: String,
    #[serde(default = "default_n")]
    pub n: usize,
}
fn default_n() -> usize { 5 }

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub took_s: f64,
    pub total_postings: usize,
    pub results: Vec<Recommendation>,
}

#[derive(Serialize)]
pub struct IndexInfo {
    pub path: String,
    pub header: IndexHeader,
    pub config: VectorizerConfig,
}

#[derive(Clone)]
pub struct AppState {
    pub index_path: PathBuf,
    /// Swapped wholesale on reload; requests clone the inner `Arc` and never
    /// hold the lock while scoring.
    pub index: Arc<RwLock<Arc<JobIndex>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn current(&self) -> Arc<JobIndex> {
        self.index.read().clone()
    }
}

/// Load the index once and build the router. Fails if the artifact is
/// missing or corrupt, so a process never serves a partial index.
pub fn build_app(index_path: impl Into<PathBuf>) -> Result<Router> {
    let index_path = index_path.into();
    let index = load_index(&index_path)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState { index_path, index: Arc::new(RwLock::new(Arc::new(index))), admin_token };
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/recommend", get(recommend_handler))
        .route("/posting/:row", get(posting_handler))
        .route("/index/info", get(info_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    params: Result<Query<RecommendParams>, QueryRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Query(params) = params?;
    let start = std::time::Instant::now();
    let index = state.current();
    let results = recommend(&index, &params.q, params.n.min(MAX_TOP_N))?;
    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, n = params.n, returned = results.len(), "recommend");
    Ok(Json(RecommendResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_postings: index.len(),
        results,
    }))
}

pub async fn posting_handler(
    State(state): State<AppState>,
    row: Result<Path<usize>, PathRejection>,
) -> Result<Json<JobPosting>, ApiError> {
    let Path(row) = row?;
    let index = state.current();
    index
        .postings
        .get(row)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no posting at row {row}")))
}

pub async fn info_handler(State(state): State<AppState>) -> Json<IndexInfo> {
    let index = state.current();
    Json(IndexInfo {
        path: state.index_path.display().to_string(),
        header: index.header.clone(),
        config: index.vectorizer.config.clone(),
    })
}

/// Re-read the artifact from disk and swap it in. A failed load keeps the
/// current index serving.
pub async fn reload_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<IndexHeader>, ApiError> {
    authorize(&state, &headers)?;
    let path = state.index_path.clone();
    let fresh = tokio::task::spawn_blocking(move || load_index(path))
        .await
        .map_err(|e| ApiError::Internal(format!("reload task failed: {e}")))??;
    let header = fresh.header.clone();
    *state.index.write() = Arc::new(fresh);
    tracing::info!(num_postings = header.num_postings, num_terms = header.num_terms, "index reloaded");
    Ok(Json(header))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".into()))
    }
}
