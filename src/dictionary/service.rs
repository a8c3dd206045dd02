//! 查询编排
//!
//! 校验参数，先查缓存；未命中时同一个键只会有一次抓取在进行，
//! 后到的相同查询直接等待这次抓取的结果。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::cache::ResultCache;
use super::config::DictionaryConfig;
use super::error::{
    helpers::{internal_error, log_error},
    ScrapeError, ScrapeResult,
};
use super::extractor::Extractor;
use super::fetcher::PageFetcher;
use super::types::{LookupKey, LookupResult};
use crate::browser::{BrowserLauncher, BrowserPool};

type SharedLookup = Shared<BoxFuture<'static, ScrapeResult<Arc<LookupResult>>>>;

/// 词典查询服务
///
/// 可廉价克隆，所有克隆共享同一个浏览器池和缓存。
#[derive(Clone)]
pub struct LookupService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    pool: Arc<BrowserPool>,
    fetcher: PageFetcher,
    extractor: Extractor,
    cache: Arc<ResultCache>,
    in_flight: DashMap<LookupKey, SharedLookup>,
    sweep_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

/// 抓取结束时移除进行中记录，任务 panic 时同样生效
struct InFlightGuard {
    inner: Arc<ServiceInner>,
    key: LookupKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.key);
    }
}

impl LookupService {
    pub fn new(
        pool: Arc<BrowserPool>,
        fetcher: PageFetcher,
        extractor: Extractor,
        cache: Arc<ResultCache>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                pool,
                fetcher,
                extractor,
                cache,
                in_flight: DashMap::new(),
                sweep_interval,
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// 按配置组装完整服务
    pub fn from_config(
        config: &DictionaryConfig,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> ScrapeResult<Self> {
        let schema = config.schema()?;
        let pool = Arc::new(BrowserPool::new(
            launcher,
            config.launch.clone(),
            config.context.clone(),
            config.request_filter(),
        ));

        Ok(Self::new(
            pool,
            PageFetcher::new(schema.clone(), config.timeouts),
            Extractor::new(schema),
            Arc::new(ResultCache::new(config.cache)),
            config.cache.sweep_interval,
        ))
    }

    /// 启动后台缓存清扫；`warm_up` 为真时提前启动浏览器
    pub async fn start(&self, warm_up: bool) -> ScrapeResult<()> {
        self.spawn_sweeper();

        if warm_up {
            let started = Instant::now();
            self.inner.pool.start().await?;
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis(),
                "浏览器预热完成"
            );
        }

        Ok(())
    }

    fn spawn_sweeper(&self) {
        let interval = self.inner.sweep_interval;
        if interval.is_zero() {
            return;
        }

        let mut sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if sweeper.is_some() {
            return;
        }

        let cache = self.inner.cache.clone();
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    tracing::debug!("清理了 {} 个过期缓存条目", removed);
                }
            }
        }));
    }

    /// 停止清扫并关闭浏览器池
    pub async fn shutdown(&self) {
        let sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = sweeper {
            handle.abort();
        }

        self.inner.pool.shutdown().await;
    }

    /// 查询一个单词
    pub async fn lookup(
        &self,
        word: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ScrapeResult<Arc<LookupResult>> {
        let key = match LookupKey::new(word, source_lang, target_lang) {
            Ok(key) => key,
            Err(e) => {
                log_error(&e, word, 0);
                return Err(e);
            }
        };

        if let Some(hit) = self.inner.cache.get(&key) {
            tracing::debug!("缓存命中: {}", key);
            return Ok(hit);
        }

        self.join_or_start(key, word, source_lang, target_lang).await
    }

    /// 加入同键的进行中抓取，或者启动一次新的抓取
    fn join_or_start(
        &self,
        key: LookupKey,
        word: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> SharedLookup {
        match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!("等待进行中的相同查询: {}", key);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // 上一次抓取可能刚写入缓存并移除记录
                if let Some(hit) = self.inner.cache.peek(&key) {
                    return futures::future::ready(Ok(hit)).boxed().shared();
                }

                let inner = self.inner.clone();
                let word = word.to_string();
                let source_lang = source_lang.to_string();
                let target_lang = target_lang.to_string();

                // 在独立任务中抓取，调用方断开也不会留下半途的页面
                let task = tokio::spawn(async move {
                    let _guard = InFlightGuard {
                        inner: inner.clone(),
                        key: key.clone(),
                    };
                    inner.scrape(&key, &word, &source_lang, &target_lang).await
                });

                let shared = async move {
                    match task.await {
                        Ok(result) => result,
                        Err(e) => Err(internal_error(format!("查询任务异常结束: {}", e))),
                    }
                }
                .boxed()
                .shared();

                entry.insert(shared.clone());
                shared
            }
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.inner.cache
    }

    pub fn pool(&self) -> &Arc<BrowserPool> {
        &self.inner.pool
    }

    /// 当前进行中的抓取数
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }
}

impl ServiceInner {
    async fn scrape(
        &self,
        key: &LookupKey,
        word: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ScrapeResult<Arc<LookupResult>> {
        let started = Instant::now();

        match self.scrape_uncached(word, source_lang, target_lang).await {
            Ok(result) => {
                let result = Arc::new(result);
                self.cache.put(key.clone(), result.clone());
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis(),
                    entries = result.len(),
                    "查询完成: {}",
                    key
                );
                Ok(result)
            }
            Err(e) => {
                log_error(&e, word, started.elapsed().as_millis());
                Err(e)
            }
        }
    }

    async fn scrape_uncached(
        &self,
        word: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ScrapeResult<LookupResult> {
        let context = self.pool.acquire_context().await?;
        let page = self
            .fetcher
            .fetch(context.as_ref(), word, source_lang, target_lang)
            .await?;

        let html = page
            .content()
            .await
            .map_err(|e| ScrapeError::Extraction(format!("无法读取页面内容: {}", e)));

        if let Err(e) = page.close().await {
            tracing::warn!("{}", e.with_context("page.close"));
        }

        Ok(self.extractor.extract(&html?))
    }
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .sweeper
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}
