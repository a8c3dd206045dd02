//! 健康检查

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::web::types::{AppState, HealthResponse};

/// 浏览器池与缓存状态
///
/// 不会触发浏览器启动；尚未有查询时 `browser_alive` 为假。
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let pool = state.lookup.pool();
    let pool_stats = pool.stats();

    Json(HealthResponse {
        status: "ok",
        browser_alive: pool.is_browser_alive().await,
        browser_launches: pool_stats.browser_launches,
        contexts_created: pool_stats.contexts_created,
        in_flight: state.lookup.in_flight_count(),
        cache_entries: state.lookup.cache().len(),
    })
}
