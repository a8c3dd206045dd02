//! 查询服务配置

use std::sync::Arc;

use super::cache::CacheConfig;
use super::error::{ScrapeError, ScrapeResult};
use super::fetcher::FetchTimeouts;
use super::schema::{PageSchema, DEFAULT_URL_TEMPLATE, GLOSBE};
use crate::browser::{ContextOptions, LaunchOptions, RequestFilter};
use crate::env::EnvConfig;

/// 查询服务配置
#[derive(Debug, Clone)]
pub struct DictionaryConfig {
    pub launch: LaunchOptions,
    pub context: ContextOptions,
    /// 在默认拦截规则之上追加的 URL 片段
    pub extra_blocked: Vec<String>,
    pub url_template: String,
    pub timeouts: FetchTimeouts,
    pub cache: CacheConfig,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            launch: LaunchOptions::default(),
            context: ContextOptions::default(),
            extra_blocked: Vec::new(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            timeouts: FetchTimeouts::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl DictionaryConfig {
    pub fn from_env_config(env: &EnvConfig) -> Self {
        let defaults = Self::default();

        Self {
            launch: LaunchOptions {
                executable_path: env.chromium_path.clone(),
                headless: env.headless,
                ..defaults.launch
            },
            context: defaults.context,
            extra_blocked: env.blocked_url_patterns.clone(),
            url_template: env.dictionary_url.clone(),
            timeouts: FetchTimeouts {
                navigation: env.navigation_timeout,
                consent: env.consent_timeout,
                content: env.content_timeout,
                ..defaults.timeouts
            },
            cache: CacheConfig {
                ttl: env.cache_ttl,
                capacity: env.cache_capacity,
                sweep_interval: env.cache_sweep_interval,
            },
        }
    }

    /// 按 URL 模板构建页面结构
    pub fn schema(&self) -> ScrapeResult<Arc<PageSchema>> {
        PageSchema::from_table(self.url_template.clone(), &GLOSBE)
            .map(Arc::new)
            .map_err(|e| ScrapeError::Config(e.to_string()))
    }

    pub fn request_filter(&self) -> RequestFilter {
        RequestFilter::default().with_extra_fragments(self.extra_blocked.iter().cloned())
    }
}
