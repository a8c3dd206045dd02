//! Web 服务器配置
//!
//! 来自类型安全的环境变量系统，命令行参数可以覆盖

use crate::env::{EnvConfig, EnvError, EnvResult};

/// Web 服务器配置
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
}

impl WebConfig {
    /// 从已加载的环境配置创建
    pub fn from_env_config(env: &EnvConfig) -> Self {
        Self {
            bind_addr: env.web_bind_address.clone(),
            port: env.web_port,
        }
    }

    /// 应用命令行覆盖
    pub fn with_overrides(mut self, bind_addr: Option<String>, port: Option<u16>) -> Self {
        if let Some(bind_addr) = bind_addr {
            self.bind_addr = bind_addr;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        if self.bind_addr.is_empty() {
            return Err(EnvError {
                variable: "DICTSCRAPE_WEB_BIND_ADDRESS".to_string(),
                message: "Bind address cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(EnvError {
                variable: "DICTSCRAPE_WEB_PORT".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
