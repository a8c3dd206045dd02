//! 页面获取
//!
//! 在共享浏览上下文中打开页面、导航、尽力关闭 Cookie 同意框并等待词典内容出现。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};

use super::error::{ScrapeError, ScrapeResult};
use super::schema::PageSchema;
use crate::browser::{BrowsingContext, PageSession};

/// 每个页面都会带上的请求头
pub const REQUEST_HEADERS: &[(&str, &str)] = &[
    ("Accept-Language", "en-US,en;q=0.9"),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Cache-Control", "no-cache"),
];

/// 各阶段时间预算
#[derive(Debug, Clone, Copy)]
pub struct FetchTimeouts {
    pub navigation: Duration,
    pub consent: Duration,
    /// 点击同意按钮后的等待
    pub consent_settle: Duration,
    pub content: Duration,
    /// 等待选择器时的轮询间隔
    pub poll_interval: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_millis(4000),
            consent: Duration::from_millis(1000),
            consent_settle: Duration::from_millis(200),
            content: Duration::from_millis(3000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// 页面获取器
#[derive(Debug, Clone)]
pub struct PageFetcher {
    schema: Arc<PageSchema>,
    timeouts: FetchTimeouts,
}

impl PageFetcher {
    pub fn new(schema: Arc<PageSchema>, timeouts: FetchTimeouts) -> Self {
        Self { schema, timeouts }
    }

    /// 打开并准备好查询页面
    ///
    /// 成功时页面交给调用方，调用方负责关闭；失败时页面已在这里关闭。
    pub async fn fetch(
        &self,
        context: &dyn BrowsingContext,
        word: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ScrapeResult<Box<dyn PageSession>> {
        let url = self.schema.lookup_url(word, source_lang, target_lang)?;
        let page = context.new_page().await?;

        match self.prepare(page.as_ref(), &url).await {
            Ok(()) => Ok(page),
            Err(e) => {
                if let Err(close_error) = page.close().await {
                    tracing::warn!("关闭失败页面时出错: {}", close_error);
                }
                Err(e)
            }
        }
    }

    async fn prepare(&self, page: &dyn PageSession, url: &str) -> ScrapeResult<()> {
        let started = Instant::now();

        page.set_extra_headers(REQUEST_HEADERS).await?;

        timeout(self.timeouts.navigation, page.navigate(url))
            .await
            .map_err(|_| {
                ScrapeError::NavigationTimeout(format!(
                    "{} 未在 {}ms 内加载",
                    url,
                    self.timeouts.navigation.as_millis()
                ))
            })??;
        tracing::debug!(elapsed_ms = started.elapsed().as_millis(), "页面已导航: {}", url);

        // 内容等待从导航结束算起，同意框处理也计入其中
        let content_deadline = Instant::now() + self.timeouts.content;

        self.dismiss_consent(page).await;

        let container = self.schema.content_container.to_string();
        let remaining = content_deadline.saturating_duration_since(Instant::now());
        let appeared = wait_for(remaining, self.timeouts.poll_interval, || {
            page.has_selector(&container)
        })
        .await?;

        if !appeared {
            return Err(ScrapeError::ContentNotFound(format!(
                "{} 未在 {}ms 内出现",
                container,
                self.timeouts.content.as_millis()
            )));
        }

        tracing::debug!(elapsed_ms = started.elapsed().as_millis(), "词典内容已就绪");
        Ok(())
    }

    /// 尽力点击 Cookie 同意按钮，任何失败都忽略
    ///
    /// 查找和点击共用一个时间预算。
    async fn dismiss_consent(&self, page: &dyn PageSession) {
        let button = self.schema.consent_button.to_string();
        let attempt = async {
            let found = wait_for(self.timeouts.consent, self.timeouts.poll_interval, || {
                page.has_selector(&button)
            })
            .await?;

            if !found {
                return Ok(false);
            }

            page.click(&button).await?;
            Ok::<_, ScrapeError>(true)
        };

        match timeout(self.timeouts.consent, attempt).await {
            Ok(Ok(true)) => {
                tracing::debug!("已关闭 Cookie 同意框");
                sleep(self.timeouts.consent_settle).await;
            }
            Ok(Ok(false)) => tracing::debug!("未发现 Cookie 同意框，继续"),
            Ok(Err(e)) => tracing::debug!("关闭 Cookie 同意框失败，继续: {}", e),
            Err(_) => tracing::debug!(
                "关闭 Cookie 同意框超过 {}ms，继续",
                self.timeouts.consent.as_millis()
            ),
        }
    }
}

/// 在时间预算内轮询条件；超时返回 `Ok(false)`
///
/// 预算为零时仍会检查一次。
async fn wait_for<F, Fut>(budget: Duration, poll_interval: Duration, mut check: F) -> ScrapeResult<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ScrapeResult<bool>>,
{
    let deadline = Instant::now() + budget;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, check()).await {
            Ok(Ok(true)) => return Ok(true),
            Ok(Ok(false)) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Ok(false),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }
        sleep(poll_interval.min(remaining)).await;
    }
}
