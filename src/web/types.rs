//! Web 模块的数据类型定义

use serde::{Deserialize, Serialize};

use crate::dictionary::{CacheStats, LookupService};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub lookup: LookupService,
}

/// 查询参数
///
/// 全部可选，缺失由查询服务统一校验并返回 400。
#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    pub word: Option<String>,
    pub src: Option<String>,
    pub dst: Option<String>,
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// 缓存统计响应
#[derive(Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
    pub ttl_seconds: u64,
}

/// 缓存操作响应
#[derive(Serialize)]
pub struct CacheActionResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: usize,
}

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub browser_alive: bool,
    pub browser_launches: u64,
    pub contexts_created: u64,
    pub in_flight: usize,
    pub cache_entries: usize,
}
