//! 词典查询统一错误处理
//!
//! 提供结构化错误类型，区分请求错误与抓取流水线各阶段的失败

use std::fmt;

use thiserror::Error;

/// 查询错误类型
///
/// 必须可 `Clone`：同一个 in-flight 查询的结果会分发给所有等待者。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// 请求参数缺失或无效
    #[error("请求无效: {0}")]
    InvalidRequest(String),

    /// 浏览器或浏览上下文无法创建
    #[error("浏览器池不可用: {0}")]
    PoolUnavailable(String),

    /// 页面导航超时
    #[error("页面导航超时: {0}")]
    NavigationTimeout(String),

    /// 页面导航失败
    #[error("页面导航失败: {0}")]
    Navigation(String),

    /// 词典内容容器未出现
    #[error("未找到词典内容: {0}")]
    ContentNotFound(String),

    /// 浏览器协议错误
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// 页面快照解析错误
    #[error("提取错误: {0}")]
    Extraction(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ScrapeError {
    /// 检查错误是否可由调用方重试
    ///
    /// 服务内部从不自动重试，这里只用于日志和响应。
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::InvalidRequest(_) => false,
            ScrapeError::PoolUnavailable(_) => true,
            ScrapeError::NavigationTimeout(_) => true,
            ScrapeError::Navigation(_) => true,
            ScrapeError::ContentNotFound(_) => true,
            ScrapeError::Browser(_) => true,
            ScrapeError::Extraction(_) => false,
            ScrapeError::Config(_) => false,
            ScrapeError::Internal(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ScrapeError::InvalidRequest(_) => ErrorSeverity::Info,
            ScrapeError::PoolUnavailable(_) => ErrorSeverity::Critical,
            ScrapeError::NavigationTimeout(_) => ErrorSeverity::Warning,
            ScrapeError::Navigation(_) => ErrorSeverity::Warning,
            ScrapeError::ContentNotFound(_) => ErrorSeverity::Warning,
            ScrapeError::Browser(_) => ErrorSeverity::Error,
            ScrapeError::Extraction(_) => ErrorSeverity::Error,
            ScrapeError::Config(_) => ErrorSeverity::Critical,
            ScrapeError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// 出错的流水线阶段
    pub fn stage(&self) -> Stage {
        match self {
            ScrapeError::InvalidRequest(_) => Stage::Validate,
            ScrapeError::PoolUnavailable(_) => Stage::Pool,
            ScrapeError::NavigationTimeout(_) | ScrapeError::Navigation(_) => Stage::Navigate,
            ScrapeError::ContentNotFound(_) => Stage::WaitContent,
            ScrapeError::Browser(_) => Stage::Fetch,
            ScrapeError::Extraction(_) => Stage::Extract,
            ScrapeError::Config(_) | ScrapeError::Internal(_) => Stage::Internal,
        }
    }

    /// 是否为客户端错误（对应 HTTP 400）
    pub fn is_client_error(&self) -> bool {
        matches!(self, ScrapeError::InvalidRequest(_))
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            ScrapeError::InvalidRequest(msg) => ScrapeError::InvalidRequest(wrap(msg)),
            ScrapeError::PoolUnavailable(msg) => ScrapeError::PoolUnavailable(wrap(msg)),
            ScrapeError::NavigationTimeout(msg) => ScrapeError::NavigationTimeout(wrap(msg)),
            ScrapeError::Navigation(msg) => ScrapeError::Navigation(wrap(msg)),
            ScrapeError::ContentNotFound(msg) => ScrapeError::ContentNotFound(wrap(msg)),
            ScrapeError::Browser(msg) => ScrapeError::Browser(wrap(msg)),
            ScrapeError::Extraction(msg) => ScrapeError::Extraction(wrap(msg)),
            ScrapeError::Config(msg) => ScrapeError::Config(wrap(msg)),
            ScrapeError::Internal(msg) => ScrapeError::Internal(wrap(msg)),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 查询流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validate,
    Pool,
    Fetch,
    Navigate,
    WaitContent,
    Extract,
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::Pool => "pool",
            Stage::Fetch => "fetch",
            Stage::Navigate => "navigate",
            Stage::WaitContent => "wait_content",
            Stage::Extract => "extract",
            Stage::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(error: url::ParseError) -> Self {
        ScrapeError::Config(format!("查询URL无效: {}", error))
    }
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(error: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Browser(error.to_string())
    }
}

/// 错误结果类型别名
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &ScrapeError, word: &str, elapsed_ms: u128) {
        let stage = error.stage();
        let retryable = error.is_retryable();
        match error.severity() {
            ErrorSeverity::Info => {
                tracing::info!(%stage, retryable, elapsed_ms, "查询 \"{}\" 被拒绝: {}", word, error)
            }
            ErrorSeverity::Warning => {
                tracing::warn!(%stage, retryable, elapsed_ms, "查询 \"{}\" 失败: {}", word, error)
            }
            ErrorSeverity::Error => {
                tracing::error!(%stage, retryable, elapsed_ms, "查询 \"{}\" 出错: {}", word, error)
            }
            ErrorSeverity::Critical => {
                tracing::error!(%stage, retryable, elapsed_ms, "查询 \"{}\" 严重错误: {}", word, error)
            }
        }
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> ScrapeError {
        ScrapeError::InvalidRequest(msg.to_string())
    }

    /// 创建浏览器池错误
    pub fn pool_error<T: fmt::Display>(msg: T) -> ScrapeError {
        ScrapeError::PoolUnavailable(msg.to_string())
    }

    /// 创建内部错误
    pub fn internal_error<T: fmt::Display>(msg: T) -> ScrapeError {
        ScrapeError::Internal(msg.to_string())
    }
}
