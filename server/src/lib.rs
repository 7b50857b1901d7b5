use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use paperdex_core::{
    rebuild_index, search, Error, ExtractConfig, IndexCache, IndexConfig, IndexStore, Paragraph, ParagraphId,
    ReindexReport, SearchResult,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, String);

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 3 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub generation: Option<u64>,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

/// Everything the server needs to answer queries and rebuild the index.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub index_dir: PathBuf,
    /// Folder `/index/rebuild` reads from; rebuilds are refused without one.
    pub corpus_dir: Option<PathBuf>,
    pub admin_token: Option<String>,
    pub extract: ExtractConfig,
    pub index: IndexConfig,
}

impl ServerConfig {
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            corpus_dir: None,
            admin_token: None,
            extract: ExtractConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

pub struct AppState {
    pub cache: IndexCache,
    pub config: ServerConfig,
    reindex: Mutex<()>,
}

impl AppState {
    /// Opens the index root and loads the current generation, if any.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let cache = IndexCache::new(IndexStore::new(&config.index_dir));
        match cache.get()? {
            Some(handle) => tracing::info!(generation = handle.generation(), "serving index"),
            None => tracing::warn!(index = %config.index_dir.display(), "no index published yet, searches return nothing"),
        }
        Ok(Self { cache, config, reindex: Mutex::new(()) })
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    Ok(router(Arc::new(AppState::new(config)?)))
}

fn router(state: Arc<AppState>) -> Router {
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
        .route("/search", get(search_handler))
        .route("/paragraph/:id", get(paragraph_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn status_of(err: &Error) -> StatusCode {
    match err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::EmptyCorpus => StatusCode::UNPROCESSABLE_ENTITY,
        Error::IndexCorrupt(_) | Error::Io { .. } | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: Error) -> ApiError {
    let status = status_of(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (status, err.to_string())
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %err, "blocking task failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let SearchParams { q: query, k } = params;
    let q = query.clone();
    let (generation, results) = tokio::task::spawn_blocking(move || {
        let handle = state.cache.get()?;
        let results = search(handle.as_deref(), &q, k)?;
        Ok::<_, Error>((handle.map(|h| h.generation()), results))
    })
    .await
    .map_err(join_error)?
    .map_err(reject)?;

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query, generation, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn paragraph_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ParagraphId>,
) -> Result<Json<Paragraph>, ApiError> {
    let paragraph = tokio::task::spawn_blocking(move || {
        let handle = state.cache.get()?;
        Ok::<_, Error>(handle.and_then(|h| h.paragraph(id).cloned()))
    })
    .await
    .map_err(join_error)?
    .map_err(reject)?;
    paragraph.map(Json).ok_or((StatusCode::NOT_FOUND, format!("paragraph {id} not found")))
}

pub async fn rebuild_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ReindexReport>, ApiError> {
    authorize(&state, &headers)?;
    let corpus_dir = state
        .config
        .corpus_dir
        .clone()
        .ok_or((StatusCode::SERVICE_UNAVAILABLE, "no corpus directory configured".to_string()))?;

    tokio::task::spawn_blocking(move || {
        let Some(_guard) = state.reindex.try_lock() else {
            return Err((StatusCode::CONFLICT, "a rebuild is already running".to_string()));
        };
        let (report, handle) =
            rebuild_index(&corpus_dir, state.cache.store(), &state.config.extract, state.config.index)
                .map_err(reject)?;
        state.cache.replace(handle);
        Ok(Json(report))
    })
    .await
    .map_err(join_error)?
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.config.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
