//! 缓存相关API处理器

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::web::types::{AppState, CacheActionResponse, CacheStatsResponse};

/// 获取缓存统计信息
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let cache = state.lookup.cache();
    let stats = cache.stats();

    Json(CacheStatsResponse {
        hit_rate: stats.hit_rate(),
        ttl_seconds: cache.ttl().as_secs(),
        stats,
    })
}

/// 清空缓存
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<CacheActionResponse> {
    let deleted_count = state.lookup.cache().clear();
    tracing::info!("已清空缓存，删除 {} 个条目", deleted_count);

    Json(CacheActionResponse {
        success: true,
        message: format!("成功清理 {} 个缓存条目", deleted_count),
        deleted_count,
    })
}

/// 清理过期缓存
pub async fn cleanup_cache(State(state): State<Arc<AppState>>) -> Json<CacheActionResponse> {
    let deleted_count = state.lookup.cache().purge_expired();

    Json(CacheActionResponse {
        success: true,
        message: format!("成功清理 {} 个过期缓存条目", deleted_count),
        deleted_count,
    })
}
