//! HTTP server and route handlers

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::dataset::{DatasetStore, DatasetSummary};
use crate::observability::Logger;
use crate::query::{QueryEngine, ResultRow};
use crate::schema::RecordKind;

use super::errors::{ApiError, ApiResult};
use super::response::ResultResponse;

/// Shared handler state
type SharedStore = Arc<RwLock<DatasetStore>>;

/// REST API server over a dataset catalog
pub struct ApiServer {
    store: SharedStore,
}

impl ApiServer {
    /// Creates a server with an empty catalog
    pub fn new() -> Self {
        Self::with_store(Arc::new(RwLock::new(DatasetStore::new())))
    }

    /// Creates a server over an existing catalog
    pub fn with_store(store: SharedStore) -> Self {
        Self { store }
    }

    /// Builds the axum router
    pub fn router(self) -> Router {
        Router::new()
            .route("/dataset/:id/:kind", put(add_dataset))
            .route("/dataset/:id", delete(remove_dataset))
            .route("/query", post(perform_query))
            .route("/datasets", get(list_datasets))
            .layer(CorsLayer::permissive())
            .with_state(self.store)
    }

    /// Binds and serves until the process exits
    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        Logger::info("SERVER_LISTENING", &[("addr", &addr.to_string())]);
        axum::serve(listener, self.router()).await
    }
}

impl Default for ApiServer {
    fn default() -> Self {
        Self::new()
    }
}

async fn add_dataset(
    State(store): State<SharedStore>,
    Path((id, kind)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<ResultResponse<Vec<String>>>> {
    let kind = RecordKind::parse(&kind).ok_or_else(|| ApiError::UnknownKind(kind.clone()))?;

    let mut store = store.write().map_err(|_| ApiError::LockPoisoned)?;
    let ids = store.add(&id, kind, &payload).map_err(|err| {
        Logger::warn("DATASET_REJECTED", &[("id", &id), ("reason", &err.to_string())]);
        ApiError::from(err)
    })?;

    Logger::info("DATASET_ADDED", &[("id", &id), ("kind", kind.as_str())]);
    Ok(Json(ResultResponse::new(ids)))
}

async fn remove_dataset(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultResponse<String>>> {
    let mut store = store.write().map_err(|_| ApiError::LockPoisoned)?;
    let removed = store.remove(&id)?;

    Logger::info("DATASET_REMOVED", &[("id", &removed)]);
    Ok(Json(ResultResponse::new(removed)))
}

async fn perform_query(
    State(store): State<SharedStore>,
    Json(query): Json<Value>,
) -> ApiResult<Json<ResultResponse<Vec<ResultRow>>>> {
    let id = QueryEngine::extract_dataset_id(&query)?;

    let store = store.read().map_err(|_| ApiError::LockPoisoned)?;
    let dataset = store
        .get(&id)
        .map_err(|_| ApiError::DatasetNotLoaded(id.clone()))?;

    let rows = QueryEngine::evaluate(&query, &id, dataset.kind, &dataset.records).map_err(
        |err| {
            let event = if err.is_internal() {
                "QUERY_DEFECT"
            } else {
                "QUERY_REJECTED"
            };
            Logger::error(event, &[("id", &id), ("code", err.code().code())]);
            ApiError::from(err)
        },
    )?;

    Logger::info(
        "QUERY_EXECUTED",
        &[("id", &id), ("rows", &rows.len().to_string())],
    );
    Ok(Json(ResultResponse::new(rows)))
}

async fn list_datasets(
    State(store): State<SharedStore>,
) -> ApiResult<Json<ResultResponse<Vec<DatasetSummary>>>> {
    let store = store.read().map_err(|_| ApiError::LockPoisoned)?;
    Ok(Json(ResultResponse::new(store.list())))
}
