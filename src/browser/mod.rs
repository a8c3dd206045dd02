//! 浏览器抽象层
//!
//! 定义浏览器进程、浏览上下文与页面三层特性，查询流程只依赖这些特性；
//! 默认实现基于 chromiumoxide（见 `chromium` 模块），测试可注入替身实现。

pub mod chromium;
pub mod filter;
pub mod pool;

pub use chromium::ChromiumLauncher;
pub use filter::{FilterDecision, RequestFilter, ResourceKind};
pub use pool::{BrowserPool, PoolStats};

use std::sync::Arc;

use async_trait::async_trait;

use crate::dictionary::error::ScrapeResult;

/// 启动参数：尽量少占资源，并隐藏自动化特征
pub const DEFAULT_BROWSER_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-web-security",
    "--disable-features=VizDisplayCompositor",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-extensions",
    "--disable-plugins",
    "--disable-default-apps",
    "--no-first-run",
    "--disable-background-networking",
    "--disable-sync",
    "--disable-translate",
    "--disable-blink-features=AutomationControlled",
    "--disable-logging",
    "--disable-gpu",
    "--memory-pressure-off",
    "--aggressive-cache-discard",
    "--disable-ipc-flooding-protection",
];

/// 固定的桌面 User-Agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 浏览器启动选项
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// 浏览器可执行文件，`None` 时使用平台默认
    pub executable_path: Option<String>,
    pub headless: bool,
    pub args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            executable_path: None,
            headless: true,
            args: DEFAULT_BROWSER_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// 浏览上下文选项
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub ignore_https_errors: bool,
    pub javascript_enabled: bool,
    pub locale: String,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1024,
            viewport_height: 768,
            ignore_https_errors: true,
            javascript_enabled: true,
            locale: "en-US".to_string(),
        }
    }
}

/// 浏览器启动器
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// 启动一个新的浏览器进程
    async fn launch(&self, options: &LaunchOptions) -> ScrapeResult<Arc<dyn BrowserHandle>>;
}

/// 已启动的浏览器进程
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    /// 浏览器是否仍然连接
    async fn is_connected(&self) -> bool;

    /// 创建新的浏览上下文，并在其上安装请求过滤规则
    async fn new_context(
        &self,
        options: &ContextOptions,
        filter: Arc<RequestFilter>,
    ) -> ScrapeResult<Arc<dyn BrowsingContext>>;

    /// 关闭浏览器进程
    async fn close(&self) -> ScrapeResult<()>;
}

/// 浏览上下文：独立的 cookie、路由规则，可打开多个页面
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    async fn new_page(&self) -> ScrapeResult<Box<dyn PageSession>>;

    async fn close(&self) -> ScrapeResult<()>;
}

/// 单个页面
///
/// 所有操作都是单次尝试，等待与超时由调用方（`PageFetcher`）负责。
#[async_trait]
pub trait PageSession: Send + Sync {
    /// 设置额外的请求头
    async fn set_extra_headers(&self, headers: &[(&str, &str)]) -> ScrapeResult<()>;

    /// 导航并等待 DOM 内容加载完成
    async fn navigate(&self, url: &str) -> ScrapeResult<()>;

    /// 点击第一个匹配选择器的元素
    async fn click(&self, selector: &str) -> ScrapeResult<()>;

    /// 页面中是否存在匹配选择器的元素
    async fn has_selector(&self, selector: &str) -> ScrapeResult<bool>;

    /// 当前 DOM 的 HTML 快照
    async fn content(&self) -> ScrapeResult<String>;

    async fn close(self: Box<Self>) -> ScrapeResult<()>;
}
