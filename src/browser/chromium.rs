//! 基于 chromiumoxide 的浏览器实现

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{BrowserContextId, CloseParams};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetScriptExecutionDisabledParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, Headers, ResourceType, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::cdp::browser_protocol::security::SetIgnoreCertificateErrorsParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{
    BrowserHandle, BrowserLauncher, BrowsingContext, ContextOptions, FilterDecision,
    LaunchOptions, PageSession, RequestFilter, ResourceKind,
};
use crate::dictionary::error::{ScrapeError, ScrapeResult};

/// DOM 就绪轮询间隔
const READY_STATE_POLL: Duration = Duration::from_millis(25);

/// Chromium 启动器
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, options: &LaunchOptions) -> ScrapeResult<Arc<dyn BrowserHandle>> {
        let mut builder = BrowserConfig::builder()
            .args(options.args.clone())
            .request_timeout(Duration::from_secs(10));

        if !options.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = options.executable_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(ScrapeError::PoolUnavailable)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::PoolUnavailable(e.to_string()))?;

        // 处理器流结束即表示与浏览器的连接已断开
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("浏览器事件处理错误: {}", e);
                }
            }
            tracing::debug!("浏览器连接已关闭");
        });

        Ok(Arc::new(ChromiumBrowser {
            browser: Arc::new(browser),
            handler_task,
        }))
    }
}

/// 已启动的 Chromium 进程
pub struct ChromiumBrowser {
    browser: Arc<Browser>,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserHandle for ChromiumBrowser {
    /// 处理器任务还在运行即视为连接正常；响应慢不算断开
    async fn is_connected(&self) -> bool {
        !self.handler_task.is_finished()
    }

    async fn new_context(
        &self,
        options: &ContextOptions,
        filter: Arc<RequestFilter>,
    ) -> ScrapeResult<Arc<dyn BrowsingContext>> {
        let response = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?;

        Ok(Arc::new(ChromiumContext {
            browser: self.browser.clone(),
            id: response.result.browser_context_id.clone(),
            options: options.clone(),
            filter,
        }))
    }

    async fn close(&self) -> ScrapeResult<()> {
        // 连接已断开时没有可以发送关闭命令的对象
        if self.handler_task.is_finished() {
            return Ok(());
        }

        let result = self.browser.execute(CloseParams::default()).await;
        self.handler_task.abort();
        result.map(|_| ()).map_err(ScrapeError::from)
    }
}

/// Chromium 浏览上下文
pub struct ChromiumContext {
    browser: Arc<Browser>,
    id: BrowserContextId,
    options: ContextOptions,
    filter: Arc<RequestFilter>,
}

impl ChromiumContext {
    async fn apply_options(&self, page: &Page) -> ScrapeResult<()> {
        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(self.options.user_agent.clone())
            .accept_language(self.options.locale.clone())
            .build()
            .map_err(ScrapeError::Browser)?;
        page.execute(user_agent).await?;

        page.execute(SetDeviceMetricsOverrideParams::new(
            self.options.viewport_width as i64,
            self.options.viewport_height as i64,
            1.0,
            false,
        ))
        .await?;

        if self.options.ignore_https_errors {
            page.execute(SetIgnoreCertificateErrorsParams::new(true))
                .await?;
        }

        if !self.options.javascript_enabled {
            page.execute(SetScriptExecutionDisabledParams::new(true))
                .await?;
        }

        Ok(())
    }

    /// 在页面上安装请求过滤规则
    async fn install_filter(&self, page: &Page) -> ScrapeResult<JoinHandle<()>> {
        let mut events = page.event_listener::<EventRequestPaused>().await?;
        page.execute(FetchEnableParams::default()).await?;

        let page = page.clone();
        let filter = self.filter.clone();

        Ok(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let kind = resource_kind(&event.resource_type);
                let outcome = match filter.decide(kind, &event.request.url) {
                    FilterDecision::Abort => page
                        .execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ()),
                    FilterDecision::Allow => page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ()),
                };

                if let Err(e) = outcome {
                    tracing::trace!("处理被拦截请求失败 {}: {}", event.request.url, e);
                }
            }
        }))
    }
}

#[async_trait]
impl BrowsingContext for ChromiumContext {
    async fn new_page(&self) -> ScrapeResult<Box<dyn PageSession>> {
        let mut params = CreateTargetParams::new("about:blank");
        params.browser_context_id = Some(self.id.clone());

        let page = self.browser.new_page(params).await?;

        let prepared = match self.apply_options(&page).await {
            Ok(()) => self.install_filter(&page).await,
            Err(e) => Err(e),
        };

        match prepared {
            Ok(interceptor) => Ok(Box::new(ChromiumPage { page, interceptor })),
            Err(e) => {
                if let Err(close_error) = page.close().await {
                    tracing::debug!("关闭未就绪页面失败: {}", close_error);
                }
                Err(e)
            }
        }
    }

    async fn close(&self) -> ScrapeResult<()> {
        self.browser
            .execute(DisposeBrowserContextParams::new(self.id.clone()))
            .await?;
        Ok(())
    }
}

/// Chromium 页面
pub struct ChromiumPage {
    page: Page,
    interceptor: JoinHandle<()>,
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn set_extra_headers(&self, headers: &[(&str, &str)]) -> ScrapeResult<()> {
        let map: serde_json::Map<String, serde_json::Value> = headers
            .iter()
            .map(|(name, value)| (name.to_string(), serde_json::Value::from(*value)))
            .collect();

        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(
                serde_json::Value::Object(map),
            )))
            .await?;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> ScrapeResult<()> {
        let response = self.page.execute(NavigateParams::new(url)).await?;
        if let Some(ref error_text) = response.result.error_text {
            return Err(ScrapeError::Navigation(format!("{}: {}", url, error_text)));
        }

        // 等到 DOMContentLoaded，不等待完整加载
        loop {
            let ready_state: String = self
                .page
                .evaluate("document.readyState")
                .await?
                .into_value()
                .map_err(|e| ScrapeError::Browser(e.to_string()))?;

            if ready_state != "loading" {
                return Ok(());
            }
            tokio::time::sleep(READY_STATE_POLL).await;
        }
    }

    async fn click(&self, selector: &str) -> ScrapeResult<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn has_selector(&self, selector: &str) -> ScrapeResult<bool> {
        let selector = serde_json::to_string(selector)
            .map_err(|e| ScrapeError::Internal(e.to_string()))?;

        self.page
            .evaluate(format!("document.querySelector({}) !== null", selector))
            .await?
            .into_value()
            .map_err(|e| ScrapeError::Browser(e.to_string()))
    }

    async fn content(&self) -> ScrapeResult<String> {
        Ok(self.page.content().await?)
    }

    async fn close(self: Box<Self>) -> ScrapeResult<()> {
        let this = *self;
        this.interceptor.abort();
        this.page.close().await?;
        Ok(())
    }
}

fn resource_kind(resource_type: &ResourceType) -> ResourceKind {
    match resource_type {
        ResourceType::Document => ResourceKind::Document,
        ResourceType::Stylesheet => ResourceKind::Stylesheet,
        ResourceType::Image => ResourceKind::Image,
        ResourceType::Media => ResourceKind::Media,
        ResourceType::Font => ResourceKind::Font,
        ResourceType::Script => ResourceKind::Script,
        ResourceType::Xhr => ResourceKind::Xhr,
        ResourceType::Fetch => ResourceKind::Fetch,
        ResourceType::WebSocket => ResourceKind::WebSocket,
        ResourceType::Manifest => ResourceKind::Manifest,
        _ => ResourceKind::Other,
    }
}
