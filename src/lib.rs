//! # Dictscrape Library
//!
//! 通过无头浏览器抓取双语词典网站，按需返回结构化的翻译词条。
//!
//! ## 模块组织
//!
//! - `browser` - 浏览器抽象、资源池与请求过滤
//! - `dictionary` - 页面获取、词条提取、结果缓存和查询编排
//! - `parsers` - HTML 快照解析与选择器
//! - `env` - 环境变量配置
//! - `web` - Web服务器功能（可选）

pub mod browser;
pub mod dictionary;
pub mod env;
pub mod parsers;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used items for convenience
pub use dictionary::{LookupResult, LookupService, ScrapeError, ScrapeResult, TranslationEntry};
