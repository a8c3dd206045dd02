//! 浏览器资源池
//!
//! 持有一个浏览器进程和一个浏览上下文，按需创建、检查健康并在查询间复用。
//! 创建与复用的判断在同一把异步锁内完成，并发调用只会看到一次创建。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{
    BrowserHandle, BrowserLauncher, BrowsingContext, ContextOptions, LaunchOptions, RequestFilter,
};
use crate::dictionary::error::{helpers::pool_error, ScrapeResult};

/// 资源池统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub browser_launches: u64,
    pub contexts_created: u64,
}

#[derive(Default)]
struct PoolState {
    /// 每次启动浏览器递增
    generation: u64,
    browser: Option<Arc<dyn BrowserHandle>>,
    /// 上下文及其所属浏览器的代数
    context: Option<(u64, Arc<dyn BrowsingContext>)>,
}

/// 浏览器资源池
pub struct BrowserPool {
    launcher: Arc<dyn BrowserLauncher>,
    launch_options: LaunchOptions,
    context_options: ContextOptions,
    filter: Arc<RequestFilter>,
    state: Mutex<PoolState>,
    browser_launches: AtomicU64,
    contexts_created: AtomicU64,
}

impl BrowserPool {
    /// 创建资源池，不会立即启动浏览器
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        launch_options: LaunchOptions,
        context_options: ContextOptions,
        filter: RequestFilter,
    ) -> Self {
        Self {
            launcher,
            launch_options,
            context_options,
            filter: Arc::new(filter),
            state: Mutex::new(PoolState::default()),
            browser_launches: AtomicU64::new(0),
            contexts_created: AtomicU64::new(0),
        }
    }

    /// 预热：提前启动浏览器并创建上下文
    pub async fn start(&self) -> ScrapeResult<()> {
        self.acquire_context().await.map(|_| ())
    }

    /// 获取可用的浏览上下文
    ///
    /// 浏览器不存在或已断开时重新启动；上下文不存在或属于旧浏览器时重新创建。
    pub async fn acquire_context(&self) -> ScrapeResult<Arc<dyn BrowsingContext>> {
        let mut state = self.state.lock().await;

        let browser = self.ensure_browser(&mut state).await?;

        if let Some((generation, context)) = &state.context {
            if *generation == state.generation {
                return Ok(context.clone());
            }
        }

        if let Some((_, stale)) = state.context.take() {
            if let Err(e) = stale.close().await {
                tracing::debug!("关闭旧浏览上下文失败（忽略）: {}", e);
            }
        }

        let context = browser
            .new_context(&self.context_options, self.filter.clone())
            .await
            .map_err(|e| pool_error(format!("无法创建浏览上下文: {}", e)))?;
        self.contexts_created.fetch_add(1, Ordering::Relaxed);
        tracing::info!(generation = state.generation, "已创建新的浏览上下文");

        state.context = Some((state.generation, context.clone()));
        Ok(context)
    }

    async fn ensure_browser(&self, state: &mut PoolState) -> ScrapeResult<Arc<dyn BrowserHandle>> {
        if let Some(browser) = state.browser.take() {
            if browser.is_connected().await {
                state.browser = Some(browser.clone());
                return Ok(browser);
            }
            tracing::warn!(generation = state.generation, "浏览器已断开，重新启动");
            // 释放旧进程和它的事件处理任务
            if let Err(e) = browser.close().await {
                tracing::debug!("关闭已断开的浏览器失败（忽略）: {}", e);
            }
        }

        let browser = self
            .launcher
            .launch(&self.launch_options)
            .await
            .map_err(|e| pool_error(format!("无法启动浏览器: {}", e)))?;

        self.browser_launches.fetch_add(1, Ordering::Relaxed);
        state.generation += 1;
        state.browser = Some(browser.clone());
        tracing::info!(generation = state.generation, "浏览器已启动");

        Ok(browser)
    }

    /// 浏览器当前是否可用（不会触发创建）
    pub async fn is_browser_alive(&self) -> bool {
        let state = self.state.lock().await;
        match state.browser {
            Some(ref browser) => browser.is_connected().await,
            None => false,
        }
    }

    /// 关闭上下文和浏览器（尽力而为）
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;

        if let Some((_, context)) = state.context.take() {
            if let Err(e) = context.close().await {
                tracing::warn!("关闭浏览上下文失败: {}", e);
            }
        }

        if let Some(browser) = state.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("关闭浏览器失败: {}", e);
            }
        }

        tracing::info!("浏览器资源池已关闭");
    }

    /// 获取统计信息
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            browser_launches: self.browser_launches.load(Ordering::Relaxed),
            contexts_created: self.contexts_created.load(Ordering::Relaxed),
        }
    }
}
