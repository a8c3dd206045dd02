//! 查询流水线集成测试
//!
//! 使用浏览器替身验证缓存、超时、单飞合并和资源池重建

use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;

use dictscrape::dictionary::{DictionaryConfig, Example, ScrapeError, TranslationEntry};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{
    dictionary_page, entry_html, hello_page, lookup_service, lookup_service_with_config,
    FakeBrowser, PageBehavior,
};

/// 测试 hello → hola 的完整查询
#[tokio::test(start_paused = true)]
async fn test_hello_hola_lookup() {
    let browser = FakeBrowser::new(hello_page());
    let service = lookup_service(&browser);

    let result = service.lookup("hello", "en", "es").await.unwrap();

    assert_eq!(
        result.entries(),
        &[TranslationEntry {
            translation: "hola".to_string(),
            grammar: None,
            concept_type: Some("interjection".to_string()),
            examples: vec![Example {
                source: "Hello!".to_string(),
                target: "¡Hola!".to_string(),
            }],
        }]
    );
    assert_eq!(browser.visited(), vec!["https://glosbe.com/en/es/hello".to_string()]);
    assert!(browser
        .headers()
        .iter()
        .any(|(name, value)| name == "Accept-Language" && value == "en-US,en;q=0.9"));
    assert_eq!(browser.pages(), 1);
    assert_eq!(browser.page_closes(), 1);

    println!("✅ 基本查询测试通过");
}

/// 测试缓存命中不再访问浏览器，且单词大小写不敏感
#[tokio::test(start_paused = true)]
async fn test_cache_hit_skips_browser() {
    let browser = FakeBrowser::new(hello_page());
    let service = lookup_service(&browser);

    let first = service.lookup("hello", "en", "es").await.unwrap();
    let second = service.lookup("HELLO", "en", "es").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(browser.navigations(), 1);
    assert_eq!(service.cache().stats().hits, 1);

    // 语言对不同则是另一个键
    service.lookup("hello", "es", "en").await.unwrap();
    assert_eq!(browser.navigations(), 2);

    println!("✅ 缓存命中测试通过");
}

/// 测试参数缺失时直接拒绝，不启动浏览器
#[tokio::test]
async fn test_missing_parameters_rejected() {
    let browser = FakeBrowser::new(hello_page());
    let service = lookup_service(&browser);

    let error = service.lookup("", "en", "es").await.unwrap_err();
    assert!(matches!(error, ScrapeError::InvalidRequest(_)));

    let error = service.lookup("hello", "  ", "es").await.unwrap_err();
    assert!(matches!(error, ScrapeError::InvalidRequest(_)));

    assert_eq!(browser.launches(), 0);
    assert_eq!(browser.navigations(), 0);

    println!("✅ 参数校验测试通过");
}

/// 测试内容容器从不出现时在预算内失败且不缓存
#[tokio::test(start_paused = true)]
async fn test_missing_content_fails_within_budget() {
    let browser = FakeBrowser::new(hello_page());
    browser.set_behavior(PageBehavior::NeverShowContent);
    let service = lookup_service(&browser);

    let started = Instant::now();
    let error = service.lookup("hello", "en", "es").await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(error, ScrapeError::ContentNotFound(_)), "got {:?}", error);
    assert!(elapsed <= Duration::from_millis(3500), "took {:?}", elapsed);
    assert!(service.cache().is_empty());
    assert_eq!(browser.page_closes(), 1);
    assert_eq!(service.in_flight_count(), 0);

    // 失败不缓存，下一次重新抓取
    browser.set_behavior(PageBehavior::Ready);
    service.lookup("hello", "en", "es").await.unwrap();
    assert_eq!(browser.navigations(), 2);

    println!("✅ 内容超时测试通过");
}

/// 测试导航挂起时按导航超时失败并关闭页面
#[tokio::test(start_paused = true)]
async fn test_navigation_hang_times_out() {
    let browser = FakeBrowser::new(hello_page());
    browser.set_behavior(PageBehavior::HangNavigation);
    let service = lookup_service(&browser);

    let started = Instant::now();
    let error = service.lookup("hello", "en", "es").await.unwrap_err();

    assert!(matches!(error, ScrapeError::NavigationTimeout(_)), "got {:?}", error);
    assert!(started.elapsed() <= Duration::from_millis(4100));
    assert_eq!(browser.page_closes(), 1);
    assert!(service.cache().is_empty());

    println!("✅ 导航超时测试通过");
}

/// 测试导航错误原样上报
#[tokio::test(start_paused = true)]
async fn test_navigation_failure() {
    let browser = FakeBrowser::new(hello_page());
    browser.set_behavior(PageBehavior::FailNavigation);
    let service = lookup_service(&browser);

    let error = service.lookup("hello", "en", "es").await.unwrap_err();
    assert!(matches!(error, ScrapeError::Navigation(_)));
    assert_eq!(browser.page_closes(), 1);

    println!("✅ 导航失败测试通过");
}

/// 测试同意框存在时会被点击，且不影响结果
#[tokio::test(start_paused = true)]
async fn test_consent_banner_is_dismissed() {
    let browser = FakeBrowser::new(hello_page());
    browser.show_consent(true);
    let service = lookup_service(&browser);

    let result = service.lookup("hello", "en", "es").await.unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(common::Counters::get(&browser.counters.clicks), 1);

    println!("✅ 同意框测试通过");
}

/// 测试同意框的查找和点击共用一秒预算
#[tokio::test(start_paused = true)]
async fn test_consent_attempt_shares_one_budget() {
    let browser = FakeBrowser::new(hello_page());
    browser.show_consent_after(Duration::from_millis(900));
    browser.hang_click(true);
    let service = lookup_service(&browser);

    let started = Instant::now();
    let result = service.lookup("hello", "en", "es").await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result.len(), 1);
    assert_eq!(common::Counters::get(&browser.counters.clicks), 1);
    assert!(
        elapsed <= Duration::from_millis(1100),
        "同意框处理耗时 {:?}",
        elapsed
    );

    println!("✅ 同意框预算测试通过");
}

/// 测试并发的相同查询只抓取一次
#[tokio::test(start_paused = true)]
async fn test_concurrent_identical_lookups_share_one_scrape() {
    let browser = FakeBrowser::new(hello_page());
    browser.set_navigation_delay(Duration::from_millis(500));
    let service = lookup_service(&browser);

    let results = join_all((0..5).map(|i| {
        let service = service.clone();
        let word = if i % 2 == 0 { "hello" } else { "Hello" };
        async move { service.lookup(word, "en", "es").await }
    }))
    .await;

    assert_eq!(browser.navigations(), 1);
    assert_eq!(browser.pages(), 1);
    for result in &results {
        assert_eq!(result.as_ref().unwrap().entries()[0].translation, "hola");
    }
    assert_eq!(service.in_flight_count(), 0);

    println!("✅ 单飞合并测试通过");
}

/// 测试并发的相同查询共享同一个失败结果
#[tokio::test(start_paused = true)]
async fn test_concurrent_identical_lookups_share_failure() {
    let browser = FakeBrowser::new(hello_page());
    browser.set_behavior(PageBehavior::NeverShowContent);
    let service = lookup_service(&browser);

    let results = join_all((0..3).map(|_| {
        let service = service.clone();
        async move { service.lookup("hello", "en", "es").await }
    }))
    .await;

    assert_eq!(browser.navigations(), 1);
    assert!(results
        .iter()
        .all(|r| matches!(r, Err(ScrapeError::ContentNotFound(_)))));
    assert_eq!(service.in_flight_count(), 0);

    println!("✅ 失败共享测试通过");
}

/// 测试并发的不同查询共用一个浏览器和上下文
#[tokio::test(start_paused = true)]
async fn test_concurrent_distinct_lookups_share_context() {
    let browser = FakeBrowser::new(hello_page());
    browser.set_navigation_delay(Duration::from_millis(200));
    let service = lookup_service(&browser);

    let results = join_all(["hello", "world", "house"].into_iter().map(|word| {
        let service = service.clone();
        async move { service.lookup(word, "en", "es").await }
    }))
    .await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(browser.launches(), 1);
    assert_eq!(browser.contexts(), 1);
    assert_eq!(browser.navigations(), 3);
    assert_eq!(browser.page_closes(), 3);

    println!("✅ 资源共享测试通过");
}

/// 测试浏览器断开后自动重建
#[tokio::test(start_paused = true)]
async fn test_browser_recreated_after_disconnect() {
    let browser = FakeBrowser::new(hello_page());
    let service = lookup_service(&browser);

    service.lookup("hello", "en", "es").await.unwrap();
    assert_eq!(browser.launches(), 1);

    browser.disconnect();
    service.lookup("world", "en", "es").await.unwrap();

    assert_eq!(browser.launches(), 2);
    assert_eq!(browser.contexts(), 2);
    assert_eq!(service.pool().stats().browser_launches, 2);

    println!("✅ 浏览器重建测试通过");
}

/// 测试每个新建上下文都安装了配置的请求过滤规则，重建时旧浏览器被关闭
#[tokio::test(start_paused = true)]
async fn test_request_filter_installed_on_every_context() {
    let browser = FakeBrowser::new(hello_page());
    let config = DictionaryConfig {
        extra_blocked: vec!["hotjar".to_string(), "doubleclick".to_string()],
        ..DictionaryConfig::default()
    };
    let service = lookup_service_with_config(&browser, &config);

    service.lookup("hello", "en", "es").await.unwrap();
    browser.disconnect();
    service.lookup("world", "en", "es").await.unwrap();

    let filters = browser.filters();
    assert_eq!(filters.len(), 2);
    for filter in &filters {
        let fragments = filter.blocked_url_fragments();
        assert!(fragments.iter().any(|f| f == "hotjar"));
        assert!(fragments.iter().any(|f| f == "doubleclick"));
        assert!(fragments.iter().any(|f| f == "google-analytics"));
    }

    assert_eq!(common::Counters::get(&browser.counters.browser_closes), 1);

    println!("✅ 请求过滤安装测试通过");
}

/// 测试浏览器启动失败时报告资源池错误，恢复后可继续查询
#[tokio::test(start_paused = true)]
async fn test_launch_failure_then_recovery() {
    let browser = FakeBrowser::new(hello_page());
    browser.fail_launch(true);
    let service = lookup_service(&browser);

    let error = service.lookup("hello", "en", "es").await.unwrap_err();
    assert!(matches!(error, ScrapeError::PoolUnavailable(_)));
    assert!(service.cache().is_empty());

    browser.fail_launch(false);
    assert!(service.lookup("hello", "en", "es").await.is_ok());
    assert_eq!(browser.launches(), 1);

    println!("✅ 启动失败恢复测试通过");
}

/// 测试页面结构不匹配时返回空结果，并且空结果同样缓存
#[tokio::test(start_paused = true)]
async fn test_empty_result_is_cached() {
    let browser = FakeBrowser::new(dictionary_page(&[]));
    let service = lookup_service(&browser);

    let result = service.lookup("zzxq", "en", "es").await.unwrap();
    assert!(result.is_empty());

    let again = service.lookup("zzxq", "en", "es").await.unwrap();
    assert!(again.is_empty());
    assert_eq!(browser.navigations(), 1);

    println!("✅ 空结果缓存测试通过");
}

/// 测试重复译文只保留第一次出现
#[tokio::test(start_paused = true)]
async fn test_duplicate_translations_keep_first() {
    let browser = FakeBrowser::new(dictionary_page(&[
        entry_html("hola", ""),
        entry_html("saludo", ""),
        entry_html("hola", ""),
        entry_html("buenas", ""),
    ]));
    let service = lookup_service(&browser);

    let result = service.lookup("hello", "en", "es").await.unwrap();
    let translations: Vec<&str> = result
        .entries()
        .iter()
        .map(|entry| entry.translation.as_str())
        .collect();

    assert_eq!(translations, vec!["hola", "saludo", "buenas"]);

    println!("✅ 去重测试通过");
}

/// 测试预热和关闭
#[tokio::test(start_paused = true)]
async fn test_warm_up_and_shutdown() {
    let browser = FakeBrowser::new(hello_page());
    let service = lookup_service(&browser);

    service.start(true).await.unwrap();
    assert_eq!(browser.launches(), 1);
    assert_eq!(browser.contexts(), 1);
    assert!(service.pool().is_browser_alive().await);

    service.lookup("hello", "en", "es").await.unwrap();
    assert_eq!(browser.launches(), 1);

    service.shutdown().await;
    assert_eq!(common::Counters::get(&browser.counters.context_closes), 1);
    assert_eq!(common::Counters::get(&browser.counters.browser_closes), 1);
    assert!(!service.pool().is_browser_alive().await);

    println!("✅ 生命周期测试通过");
}
