//! 请求过滤
//!
//! 安装在浏览上下文上，拦截图片、字体、跟踪脚本等与查询无关的请求，缩短页面加载时间。

/// 被拦截请求的资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Xhr,
    Fetch,
    WebSocket,
    Manifest,
    Other,
}

/// 过滤决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Allow,
    Abort,
}

/// 默认屏蔽的资源类型
pub const BLOCKED_RESOURCE_KINDS: &[ResourceKind] = &[
    ResourceKind::Image,
    ResourceKind::Font,
    ResourceKind::Media,
    ResourceKind::WebSocket,
    ResourceKind::Manifest,
];

/// 默认屏蔽的URL片段（统计跟踪域名、图片扩展名、字体扩展名）
pub const BLOCKED_URL_FRAGMENTS: &[&str] = &[
    "google-analytics",
    "gtag",
    "facebook",
    "twitter",
    ".jpg",
    ".png",
    ".gif",
    ".svg",
    ".woff",
];

/// 请求过滤规则集
#[derive(Debug, Clone)]
pub struct RequestFilter {
    blocked_kinds: Vec<ResourceKind>,
    blocked_url_fragments: Vec<String>,
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self {
            blocked_kinds: BLOCKED_RESOURCE_KINDS.to_vec(),
            blocked_url_fragments: BLOCKED_URL_FRAGMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RequestFilter {
    /// 在默认规则之上追加URL片段
    pub fn with_extra_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for fragment in fragments {
            let fragment = fragment.into();
            if !fragment.is_empty() && !self.blocked_url_fragments.contains(&fragment) {
                self.blocked_url_fragments.push(fragment);
            }
        }
        self
    }

    /// 判断请求应放行还是中止
    pub fn decide(&self, kind: ResourceKind, url: &str) -> FilterDecision {
        if self.blocked_kinds.contains(&kind)
            || self
                .blocked_url_fragments
                .iter()
                .any(|fragment| url.contains(fragment.as_str()))
        {
            FilterDecision::Abort
        } else {
            FilterDecision::Allow
        }
    }

    pub fn blocked_url_fragments(&self) -> &[String] {
        &self.blocked_url_fragments
    }
}
