// 集成测试公共模块
//
// 提供可编程的浏览器替身：统计启动、上下文、页面、导航和关闭次数，
// 并可模拟导航挂起、内容缺失、同意框延迟出现、点击挂起、启动失败和连接断开。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use dictscrape::browser::{
    BrowserHandle, BrowserLauncher, BrowserPool, BrowsingContext, ContextOptions, LaunchOptions,
    PageSession, RequestFilter,
};
use dictscrape::dictionary::{
    CacheConfig, DictionaryConfig, Extractor, LookupService, PageFetcher, PageSchema,
    ResultCache, ScrapeError, ScrapeResult,
};

pub const CONTENT_SELECTOR: &str = "#dictionary-content";
pub const CONSENT_SELECTOR: &str = "button.fc-cta-consent.fc-primary-button";

/// 页面行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBehavior {
    /// 正常加载，内容立即出现
    Ready,
    /// 导航永不返回
    HangNavigation,
    /// 导航报错
    FailNavigation,
    /// 导航成功但内容容器从不出现
    NeverShowContent,
}

/// 调用计数
#[derive(Debug, Default)]
pub struct Counters {
    pub launches: AtomicUsize,
    pub browser_closes: AtomicUsize,
    pub contexts: AtomicUsize,
    pub context_closes: AtomicUsize,
    pub pages: AtomicUsize,
    pub page_closes: AtomicUsize,
    pub navigations: AtomicUsize,
    pub clicks: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// 浏览器替身
pub struct FakeBrowser {
    pub counters: Counters,
    html: Mutex<String>,
    behavior: Mutex<PageBehavior>,
    navigation_delay: Mutex<Duration>,
    consent_visible: AtomicBool,
    consent_delay: Mutex<Duration>,
    hang_click: AtomicBool,
    fail_launch: AtomicBool,
    current_connection: Mutex<Option<Arc<AtomicBool>>>,
    visited: Mutex<Vec<String>>,
    headers: Mutex<Vec<(String, String)>>,
    filters: Mutex<Vec<Arc<RequestFilter>>>,
}

impl FakeBrowser {
    pub fn new(html: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            counters: Counters::default(),
            html: Mutex::new(html.into()),
            behavior: Mutex::new(PageBehavior::Ready),
            navigation_delay: Mutex::new(Duration::ZERO),
            consent_visible: AtomicBool::new(false),
            consent_delay: Mutex::new(Duration::ZERO),
            hang_click: AtomicBool::new(false),
            fail_launch: AtomicBool::new(false),
            current_connection: Mutex::new(None),
            visited: Mutex::new(Vec::new()),
            headers: Mutex::new(Vec::new()),
            filters: Mutex::new(Vec::new()),
        })
    }

    pub fn set_html(&self, html: impl Into<String>) {
        *self.html.lock().unwrap() = html.into();
    }

    pub fn set_behavior(&self, behavior: PageBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_navigation_delay(&self, delay: Duration) {
        *self.navigation_delay.lock().unwrap() = delay;
    }

    pub fn show_consent(&self, visible: bool) {
        self.consent_visible.store(visible, Ordering::SeqCst);
    }

    /// 同意框在导航结束 `delay` 之后才出现
    pub fn show_consent_after(&self, delay: Duration) {
        *self.consent_delay.lock().unwrap() = delay;
        self.consent_visible.store(true, Ordering::SeqCst);
    }

    /// 点击永不返回
    pub fn hang_click(&self, hang: bool) {
        self.hang_click.store(hang, Ordering::SeqCst);
    }

    pub fn fail_launch(&self, fail: bool) {
        self.fail_launch.store(fail, Ordering::SeqCst);
    }

    /// 模拟浏览器进程崩溃
    pub fn disconnect(&self) {
        if let Some(connected) = self.current_connection.lock().unwrap().as_ref() {
            connected.store(false, Ordering::SeqCst);
        }
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        self.headers.lock().unwrap().clone()
    }

    /// 每个新建上下文收到的请求过滤规则
    pub fn filters(&self) -> Vec<Arc<RequestFilter>> {
        self.filters.lock().unwrap().clone()
    }

    pub fn launches(&self) -> usize {
        Counters::get(&self.counters.launches)
    }

    pub fn contexts(&self) -> usize {
        Counters::get(&self.counters.contexts)
    }

    pub fn navigations(&self) -> usize {
        Counters::get(&self.counters.navigations)
    }

    pub fn pages(&self) -> usize {
        Counters::get(&self.counters.pages)
    }

    pub fn page_closes(&self) -> usize {
        Counters::get(&self.counters.page_closes)
    }

    fn behavior(&self) -> PageBehavior {
        *self.behavior.lock().unwrap()
    }
}

/// 让 `Arc<FakeBrowser>` 作为启动器注入资源池
pub struct FakeLauncher(pub Arc<FakeBrowser>);

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> ScrapeResult<Arc<dyn BrowserHandle>> {
        tokio::task::yield_now().await;

        if self.0.fail_launch.load(Ordering::SeqCst) {
            return Err(ScrapeError::Browser("executable not found".to_string()));
        }

        self.0.counters.launches.fetch_add(1, Ordering::SeqCst);
        let connected = Arc::new(AtomicBool::new(true));
        *self.0.current_connection.lock().unwrap() = Some(connected.clone());

        Ok(Arc::new(FakeHandle {
            browser: self.0.clone(),
            connected,
        }))
    }
}

struct FakeHandle {
    browser: Arc<FakeBrowser>,
    connected: Arc<AtomicBool>,
}

#[async_trait]
impl BrowserHandle for FakeHandle {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn new_context(
        &self,
        _options: &ContextOptions,
        filter: Arc<RequestFilter>,
    ) -> ScrapeResult<Arc<dyn BrowsingContext>> {
        // 让并发调用有机会交错
        tokio::task::yield_now().await;
        self.browser.counters.contexts.fetch_add(1, Ordering::SeqCst);
        self.browser.filters.lock().unwrap().push(filter);
        Ok(Arc::new(FakeContext {
            browser: self.browser.clone(),
        }))
    }

    async fn close(&self) -> ScrapeResult<()> {
        self.browser.counters.browser_closes.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeContext {
    browser: Arc<FakeBrowser>,
}

#[async_trait]
impl BrowsingContext for FakeContext {
    async fn new_page(&self) -> ScrapeResult<Box<dyn PageSession>> {
        self.browser.counters.pages.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            browser: self.browser.clone(),
            navigated_at: Mutex::new(None),
        }))
    }

    async fn close(&self) -> ScrapeResult<()> {
        self.browser.counters.context_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakePage {
    browser: Arc<FakeBrowser>,
    navigated_at: Mutex<Option<Instant>>,
}

impl FakePage {
    fn consent_visible(&self) -> bool {
        if !self.browser.consent_visible.load(Ordering::SeqCst) {
            return false;
        }
        let delay = *self.browser.consent_delay.lock().unwrap();
        match *self.navigated_at.lock().unwrap() {
            Some(at) => at.elapsed() >= delay,
            None => false,
        }
    }
}

#[async_trait]
impl PageSession for FakePage {
    async fn set_extra_headers(&self, headers: &[(&str, &str)]) -> ScrapeResult<()> {
        *self.browser.headers.lock().unwrap() = headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Ok(())
    }

    async fn navigate(&self, url: &str) -> ScrapeResult<()> {
        self.browser.counters.navigations.fetch_add(1, Ordering::SeqCst);
        self.browser.visited.lock().unwrap().push(url.to_string());

        match self.browser.behavior() {
            PageBehavior::HangNavigation => std::future::pending().await,
            PageBehavior::FailNavigation => {
                Err(ScrapeError::Navigation(format!("{}: net::ERR_NAME_NOT_RESOLVED", url)))
            }
            PageBehavior::Ready | PageBehavior::NeverShowContent => {
                let delay = *self.browser.navigation_delay.lock().unwrap();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                *self.navigated_at.lock().unwrap() = Some(Instant::now());
                Ok(())
            }
        }
    }

    async fn click(&self, _selector: &str) -> ScrapeResult<()> {
        self.browser.counters.clicks.fetch_add(1, Ordering::SeqCst);
        if self.browser.hang_click.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn has_selector(&self, selector: &str) -> ScrapeResult<bool> {
        Ok(match selector {
            CONSENT_SELECTOR => self.consent_visible(),
            CONTENT_SELECTOR => self.browser.behavior() != PageBehavior::NeverShowContent,
            _ => false,
        })
    }

    async fn content(&self) -> ScrapeResult<String> {
        Ok(self.browser.html.lock().unwrap().clone())
    }

    async fn close(self: Box<Self>) -> ScrapeResult<()> {
        self.browser.counters.page_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 使用默认配置和浏览器替身创建查询服务
pub fn lookup_service(browser: &Arc<FakeBrowser>) -> LookupService {
    LookupService::from_config(
        &DictionaryConfig::default(),
        Arc::new(FakeLauncher(browser.clone())),
    )
    .expect("default config should be valid")
}

/// 使用指定配置和浏览器替身创建查询服务
pub fn lookup_service_with_config(
    browser: &Arc<FakeBrowser>,
    config: &DictionaryConfig,
) -> LookupService {
    LookupService::from_config(config, Arc::new(FakeLauncher(browser.clone())))
        .expect("config should be valid")
}

/// 使用自定义缓存配置创建查询服务
pub fn lookup_service_with_cache(browser: &Arc<FakeBrowser>, cache: CacheConfig) -> LookupService {
    let config = DictionaryConfig::default();
    let schema = Arc::new(PageSchema::glosbe().expect("schema should parse"));
    let pool = Arc::new(BrowserPool::new(
        Arc::new(FakeLauncher(browser.clone())),
        config.launch.clone(),
        config.context.clone(),
        config.request_filter(),
    ));

    LookupService::new(
        pool,
        PageFetcher::new(schema.clone(), config.timeouts),
        Extractor::new(schema),
        Arc::new(ResultCache::new(cache)),
        cache.sweep_interval,
    )
}

/// 单个词条的 HTML
pub fn entry_html(phrase: &str, inner: &str) -> String {
    format!(
        r#"<li class="translation__item">
             <h3 class="translation__item__pharse">{}</h3>
             {}
           </li>"#,
        phrase, inner
    )
}

/// 完整的词典页面
pub fn dictionary_page(items: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
           <html><head><title>dictionary</title></head><body>
             <div id="dictionary-content">
               <ul class="pr-1">{}</ul>
             </div>
           </body></html>"#,
        items.join("\n")
    )
}

/// hello → hola 的页面
pub fn hello_page() -> String {
    dictionary_page(&[entry_html(
        "hola",
        r#"<p class="translation__definition"><span lang="en">interjection</span></p>
           <div class="translation__example"><p>Hello!</p><p>¡Hola!</p></div>"#,
    )])
}
