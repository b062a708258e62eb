use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum_auth::AuthBearer;
use log::info;
use serde_json::Value;
use tokio::task::block_in_place;

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::metrics;
use crate::record::{Query, Record};

/// 添加一条签名记录到索引
#[utoipa::path(
    post,
    path = "/add",
    request_body = RecordForm,
    responses(
        (status = 200, body = AddResponse),
        (status = 400, description = "无效的记录"),
    ),
    security(("bearer" = []))
)]
pub async fn add_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    Json(data): Json<Value>,
) -> Result<Json<AddResponse>> {
    if !state.authorize(&token) {
        return Err(AppError::Unauthorized);
    }
    let record = Record::from_json(data)?;
    info!("添加记录: {}", record.path);
    let stored = block_in_place(|| state.index.insert(record))?;
    Ok(Json(AddResponse { stored }))
}

/// 搜索与签名相似的记录
#[utoipa::path(
    post,
    path = "/search",
    request_body = RecordForm,
    responses(
        (status = 200, body = SearchResponse),
        (status = 400, description = "无效的查询"),
    ),
    security(("bearer" = []))
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    Json(data): Json<Value>,
) -> Result<Json<SearchResponse>> {
    if !state.authorize(&token) {
        return Err(AppError::Unauthorized);
    }
    let start = Instant::now();
    let query = Query::from_json(data)?;
    let result = block_in_place(|| state.index.search(&query))?;
    Ok(Json(SearchResponse { time: start.elapsed().as_millis() as u64, result }))
}

/// 获取索引统计信息
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, body = StatsResponse),
    ),
    security(("bearer" = []))
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
) -> Result<Json<StatsResponse>> {
    if !state.authorize(&token) {
        return Err(AppError::Unauthorized);
    }
    Ok(Json(StatsResponse {
        buckets: state.index.bucket_count(),
        entries: state.index.entry_count(),
        dimension: state.index.dimension(),
        distance_cutoff: state.index.distance_cutoff(),
    }))
}

/// 导出 prometheus 指标
#[utoipa::path(get, path = "/metrics", responses((status = 200, body = String)))]
pub async fn metrics_handler() -> Result<String> {
    Ok(metrics::gather_text()?)
}
