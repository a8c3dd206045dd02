//! Web 路由定义

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::web::{handlers::*, types::AppState};

/// 创建路由结构
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/lookup", get(lookup_word))
        // 旧客户端使用的路径
        .route("/api/scrapDictionary", get(lookup_word))
        .route("/health", get(health_check))
        .route("/api/cache/stats", get(get_cache_stats))
        .route("/api/cache/clear", post(clear_cache))
        .route("/api/cache/cleanup", post(cleanup_cache))
}
