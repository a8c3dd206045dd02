//! Web 服务器模块
//!
//! 通过 HTTP 提供词典查询和缓存管理

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use handlers::*;
pub use routes::*;
pub use types::*;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::dictionary::{LookupService, ScrapeError, ScrapeResult};

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    lookup: LookupService,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: WebConfig, lookup: LookupService) -> Self {
        Self { config, lookup }
    }

    /// 启动 Web 服务器，`shutdown` 完成后停止接收请求并关闭浏览器池
    pub async fn start<F>(&self, shutdown: F) -> ScrapeResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate().map_err(|e| ScrapeError::Config(e.to_string()))?;

        let app = create_router(Arc::new(AppState {
            lookup: self.lookup.clone(),
        }));

        let listener = tokio::net::TcpListener::bind(self.config.listen_address())
            .await
            .map_err(|e| ScrapeError::Config(format!("Failed to bind server: {}", e)))?;

        tracing::info!("Web server starting at http://{}", self.config.listen_address());

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ScrapeError::Internal(format!("Server error: {}", e)));

        self.lookup.shutdown().await;
        served
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_routes()
        .with_state(app_state)
        .layer(CorsLayer::permissive())
}
