//! 词典查询
//!
//! 页面获取、词条提取、结果缓存和查询编排。

pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod schema;
pub mod service;
pub mod types;

pub use cache::{CacheConfig, CacheStats, ResultCache};
pub use config::DictionaryConfig;
pub use error::{ScrapeError, ScrapeResult};
pub use extractor::Extractor;
pub use fetcher::{FetchTimeouts, PageFetcher};
pub use schema::PageSchema;
pub use service::LookupService;
pub use types::{Example, LookupKey, LookupResult, TranslationEntry, MAX_ENTRIES};
