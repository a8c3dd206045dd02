//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量管理

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 未设置时返回 `None`，设置了但无效时返回错误
    fn get_optional() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "DICTSCRAPE_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 浏览器相关环境变量
pub mod browser {
    use super::*;

    /// 浏览器可执行文件路径
    pub struct ExecutablePath;
    impl EnvVar<String> for ExecutablePath {
        const NAME: &'static str = "DICTSCRAPE_CHROMIUM_PATH";
        const DEFAULT: Option<String> = None; // 未设置时使用平台默认浏览器
        const DESCRIPTION: &'static str = "Path to the Chromium executable (platform default when unset)";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Executable path cannot be empty".to_string(),
                });
            }
            Ok(path.to_string())
        }
    }

    /// 无头模式
    pub struct Headless;
    impl EnvVar<bool> for Headless {
        const NAME: &'static str = "DICTSCRAPE_HEADLESS";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Run the browser without a window";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 额外屏蔽的URL片段
    pub struct BlockedUrlPatterns;
    impl EnvVar<Vec<String>> for BlockedUrlPatterns {
        const NAME: &'static str = "DICTSCRAPE_BLOCKED_URL_PATTERNS";
        const DEFAULT: Option<Vec<String>> = None;

        fn get() -> EnvResult<Vec<String>> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(Vec::new()),
            }
        }
        const DESCRIPTION: &'static str =
            "Extra URL substrings whose requests are aborted (comma-separated)";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            Ok(value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect())
        }
    }
}

/// 词典查询相关环境变量
pub mod lookup {
    use super::*;

    /// 词典URL模板
    pub struct DictionaryUrl;
    impl EnvVar<String> for DictionaryUrl {
        const NAME: &'static str = "DICTSCRAPE_DICTIONARY_URL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(crate::dictionary::schema::DEFAULT_URL_TEMPLATE.to_string()),
            }
        }
        const DESCRIPTION: &'static str =
            "Dictionary URL template with {src}, {dst} and {word} placeholders";

        fn parse(value: &str) -> EnvResult<String> {
            let template = value.trim();
            if !(template.starts_with("http://") || template.starts_with("https://")) {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "URL template must start with http:// or https://".to_string(),
                });
            }
            for placeholder in ["{src}", "{dst}", "{word}"] {
                if !template.contains(placeholder) {
                    return Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: format!("URL template is missing {}", placeholder),
                    });
                }
            }
            Ok(template.to_string())
        }
    }

    /// 导航超时
    pub struct NavigationTimeout;
    impl EnvVar<Duration> for NavigationTimeout {
        const NAME: &'static str = "DICTSCRAPE_NAVIGATION_TIMEOUT_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(4000));
        const DESCRIPTION: &'static str = "Navigation timeout in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 100, 60_000)
        }
    }

    /// Cookie同意按钮超时
    pub struct ConsentTimeout;
    impl EnvVar<Duration> for ConsentTimeout {
        const NAME: &'static str = "DICTSCRAPE_CONSENT_TIMEOUT_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(1000));
        const DESCRIPTION: &'static str = "Cookie consent dismissal timeout in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 10_000)
        }
    }

    /// 内容容器等待超时
    pub struct ContentTimeout;
    impl EnvVar<Duration> for ContentTimeout {
        const NAME: &'static str = "DICTSCRAPE_CONTENT_TIMEOUT_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(3000));
        const DESCRIPTION: &'static str = "Dictionary content wait timeout in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 100, 60_000)
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存TTL
    pub struct Ttl;
    impl EnvVar<Duration> for Ttl {
        const NAME: &'static str = "DICTSCRAPE_CACHE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(15 * 60));
        const DESCRIPTION: &'static str = "Result cache TTL in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "TTL must be greater than 0".to_string(),
                });
            }

            if seconds > 86400 * 7 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "TTL too long (maximum 7 days)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }

    /// 缓存容量
    pub struct Capacity;
    impl EnvVar<usize> for Capacity {
        const NAME: &'static str = "DICTSCRAPE_CACHE_CAPACITY";
        const DEFAULT: Option<usize> = Some(1000);
        const DESCRIPTION: &'static str = "Result cache capacity (number of lookups)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1_000_000)
        }
    }

    /// 过期清理间隔
    pub struct SweepInterval;
    impl EnvVar<Duration> for SweepInterval {
        const NAME: &'static str = "DICTSCRAPE_CACHE_SWEEP_INTERVAL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(60));
        const DESCRIPTION: &'static str = "Expired entry sweep interval in seconds (0 disables)";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;
            Ok(Duration::from_secs(seconds))
        }
    }
}

/// Web服务器相关环境变量
pub mod web {
    use super::*;

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "DICTSCRAPE_WEB_BIND_ADDRESS";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("127.0.0.1".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Web server bind address";

        fn parse(value: &str) -> EnvResult<String> {
            let addr = value.trim();
            if addr.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Address cannot be empty".to_string(),
                });
            }
            Ok(addr.to_string())
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "DICTSCRAPE_WEB_PORT";
        const DEFAULT: Option<u16> = Some(7080);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            let port: u16 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid port number (1-65535)".to_string(),
            })?;

            if port == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Port cannot be 0".to_string(),
                });
            }

            Ok(port)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_millis(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let millis: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of milliseconds".to_string(),
    })?;

    if millis < min || millis > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {}ms is outside {}..={}ms", millis, min, max),
        });
    }

    Ok(Duration::from_millis(millis))
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    // 核心配置
    pub log_level: String,

    // 浏览器配置
    pub chromium_path: Option<String>,
    pub headless: bool,
    pub blocked_url_patterns: Vec<String>,

    // 查询配置
    pub dictionary_url: String,
    pub navigation_timeout: Duration,
    pub consent_timeout: Duration,
    pub content_timeout: Duration,

    // 缓存配置
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub cache_sweep_interval: Duration,

    // Web配置
    pub web_bind_address: String,
    pub web_port: u16,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,

            chromium_path: browser::ExecutablePath::get_optional()?,
            headless: browser::Headless::get()?,
            blocked_url_patterns: browser::BlockedUrlPatterns::get()?,

            dictionary_url: lookup::DictionaryUrl::get()?,
            navigation_timeout: lookup::NavigationTimeout::get()?,
            consent_timeout: lookup::ConsentTimeout::get()?,
            content_timeout: lookup::ContentTimeout::get()?,

            cache_ttl: cache::Ttl::get()?,
            cache_capacity: cache::Capacity::get()?,
            cache_sweep_interval: cache::SweepInterval::get()?,

            web_bind_address: web::BindAddress::get()?,
            web_port: web::Port::get()?,
        })
    }

    /// 打印配置摘要
    pub fn print_summary(&self) {
        println!("Environment Configuration Summary:");
        println!("  Log Level: {}", self.log_level);
        println!(
            "  Browser: {}{}",
            self.chromium_path.as_deref().unwrap_or("<platform default>"),
            if self.headless { " (headless)" } else { "" }
        );
        println!("  Dictionary: {}", self.dictionary_url);
        println!(
            "  Timeouts: navigation {}ms, consent {}ms, content {}ms",
            self.navigation_timeout.as_millis(),
            self.consent_timeout.as_millis(),
            self.content_timeout.as_millis()
        );
        println!(
            "  Cache: {} entries, TTL {}s",
            self.cache_capacity,
            self.cache_ttl.as_secs()
        );
        println!("  Web Server: {}:{}", self.web_bind_address, self.web_port);
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    fn line<T: fmt::Debug>(name: &str, description: &str, default: Option<T>) -> String {
        format!("- `{}`: {} (default: {:?})\n", name, description, default)
    }

    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&line(core::LogLevel::NAME, core::LogLevel::DESCRIPTION, Some("info")));

    docs.push_str("\n## Browser Configuration\n\n");
    docs.push_str(&line(
        browser::ExecutablePath::NAME,
        browser::ExecutablePath::DESCRIPTION,
        browser::ExecutablePath::DEFAULT,
    ));
    docs.push_str(&line(
        browser::Headless::NAME,
        browser::Headless::DESCRIPTION,
        browser::Headless::DEFAULT,
    ));
    docs.push_str(&line(
        browser::BlockedUrlPatterns::NAME,
        browser::BlockedUrlPatterns::DESCRIPTION,
        Some(Vec::<String>::new()),
    ));

    docs.push_str("\n## Lookup Configuration\n\n");
    docs.push_str(&line(
        lookup::DictionaryUrl::NAME,
        lookup::DictionaryUrl::DESCRIPTION,
        Some(crate::dictionary::schema::DEFAULT_URL_TEMPLATE),
    ));
    docs.push_str(&line(
        lookup::NavigationTimeout::NAME,
        lookup::NavigationTimeout::DESCRIPTION,
        lookup::NavigationTimeout::DEFAULT,
    ));
    docs.push_str(&line(
        lookup::ConsentTimeout::NAME,
        lookup::ConsentTimeout::DESCRIPTION,
        lookup::ConsentTimeout::DEFAULT,
    ));
    docs.push_str(&line(
        lookup::ContentTimeout::NAME,
        lookup::ContentTimeout::DESCRIPTION,
        lookup::ContentTimeout::DEFAULT,
    ));

    docs.push_str("\n## Cache Configuration\n\n");
    docs.push_str(&line(cache::Ttl::NAME, cache::Ttl::DESCRIPTION, cache::Ttl::DEFAULT));
    docs.push_str(&line(
        cache::Capacity::NAME,
        cache::Capacity::DESCRIPTION,
        cache::Capacity::DEFAULT,
    ));
    docs.push_str(&line(
        cache::SweepInterval::NAME,
        cache::SweepInterval::DESCRIPTION,
        cache::SweepInterval::DEFAULT,
    ));

    docs.push_str("\n## Web Server Configuration\n\n");
    docs.push_str(&line(web::BindAddress::NAME, web::BindAddress::DESCRIPTION, Some("127.0.0.1")));
    docs.push_str(&line(web::Port::NAME, web::Port::DESCRIPTION, web::Port::DEFAULT));

    docs
}
