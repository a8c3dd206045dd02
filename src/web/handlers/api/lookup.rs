//! 词典查询API

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::dictionary::{ScrapeError, TranslationEntry};
use crate::web::types::{AppState, ErrorResponse, LookupQuery};

/// 流水线失败时返回给客户端的通用消息
pub const PROCESSING_FAILED: &str = "Processing failed";

/// 查询单词
///
/// `GET /lookup?src=<lang>&dst=<lang>&word=<string>`
pub async fn lookup_word(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Json<Vec<TranslationEntry>>, (StatusCode, Json<ErrorResponse>)> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!("查询参数无法解析: {}", rejection.body_text());
        error_response(&ScrapeError::InvalidRequest(format!(
            "Invalid query string: {}",
            rejection.body_text()
        )))
    })?;

    let word = query.word.unwrap_or_default();
    let src = query.src.unwrap_or_default();
    let dst = query.dst.unwrap_or_default();

    match state.lookup.lookup(&word, &src, &dst).await {
        Ok(result) => Ok(Json(result.entries().to_vec())),
        Err(e) => Err(error_response(&e)),
    }
}

/// 错误到 HTTP 响应的映射；细节只写入日志
pub fn error_response(error: &ScrapeError) -> (StatusCode, Json<ErrorResponse>) {
    match error {
        ScrapeError::InvalidRequest(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: message.clone(),
            }),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: PROCESSING_FAILED.to_string(),
            }),
        ),
    }
}
