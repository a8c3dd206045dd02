//! Web 服务器主程序入口

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use dictscrape::browser::ChromiumLauncher;
use dictscrape::dictionary::{DictionaryConfig, LookupService};
use dictscrape::env::{generate_env_docs, EnvConfig};
use dictscrape::web::{WebConfig, WebServer};

#[derive(Parser)]
#[command(
    name = "dictscrape-web",
    about = "Bilingual dictionary lookups through a pooled headless browser"
)]
struct Cli {
    /// Bind address (overrides DICTSCRAPE_WEB_BIND_ADDRESS)
    #[arg(short, long)]
    bind: Option<String>,
    /// Port number (overrides DICTSCRAPE_WEB_PORT)
    #[arg(short, long)]
    port: Option<u16>,
    /// Launch the browser before accepting requests
    #[arg(long)]
    warm_up: bool,
    /// Print environment variable documentation and exit
    #[arg(long)]
    print_env_docs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_env_docs {
        print!("{}", generate_env_docs());
        return Ok(());
    }

    load_dotenv();

    let env = EnvConfig::from_env()?;
    let level: tracing::Level = env.log_level.parse()?;
    tracing_subscriber::fmt().with_max_level(level).init();
    if level >= tracing::Level::DEBUG {
        env.print_summary();
    }

    let web_config = WebConfig::from_env_config(&env).with_overrides(cli.bind, cli.port);

    let dictionary_config = DictionaryConfig::from_env_config(&env);
    let lookup = LookupService::from_config(&dictionary_config, Arc::new(ChromiumLauncher))?;

    if let Err(e) = lookup.start(cli.warm_up).await {
        // 预热失败不致命，首个查询会再次尝试启动
        tracing::warn!("浏览器预热失败: {}", e);
    }

    let server = WebServer::new(web_config, lookup);
    server.start(shutdown_signal()).await?;

    tracing::info!("服务已停止");
    Ok(())
}

/// 按优先级加载第一个存在的 .env 文件
fn load_dotenv() {
    let env_files = [".env.local", ".env"];

    for env_file in &env_files {
        if Path::new(env_file).exists() {
            if let Err(e) = dotenv::from_filename(env_file) {
                eprintln!("无法加载环境变量文件 {}: {}", env_file, e);
            }
            break;
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听 Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到停止信号，正在关闭");
}
