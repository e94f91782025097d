//! ServerChan Notify CLI
//!
//! 从终端驱动插件：发送测试消息、投递事件、查看状态和配置页面。

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serverchan_notify::config::{mask_api_url, mask_key};
use serverchan_notify::notification::{compose, MessageParts};
use serverchan_notify::{
    CliHost, ConfigStore, DispatchResult, EventCatalog, EventType, NotificationEvent, Plugin,
    ServerChanPlugin,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "scn")]
#[command(about = "ServerChan Notify - 将通知事件转发到 Server酱")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/serverchan-notify/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 事件类型目录文件（默认与配置文件同目录的 event_types.json）
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// 通知消息类型目录文件（默认与配置文件同目录的 notice_types.json）
    #[arg(long, global = true)]
    notice_catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 发送测试消息
    Test,
    /// 直接发送一条消息
    Send {
        /// 标题
        #[arg(long, short)]
        title: String,
        /// 正文
        #[arg(long, short = 'm', default_value = "")]
        text: String,
        /// 图片 URL（需开启 sendImageEnabled）
        #[arg(long)]
        image: Option<String>,
        /// 标签，多个用 | 分隔
        #[arg(long)]
        tags: Option<String>,
    },
    /// 投递一个事件，走完整的过滤/映射/发送流程
    Emit {
        /// 事件类型 id
        #[arg(long)]
        event_type: String,
        /// 事件数据（JSON 对象）
        #[arg(long, default_value = "{}")]
        payload: String,
    },
    /// 查看插件状态
    State {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 输出配置页面定义
    Form,
    /// 列出事件类型目录
    Types,
    /// 显示当前配置
    Config,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("serverchan_notify=info,scn=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

fn load_catalog(path: &Path, fallback: impl FnOnce() -> EventCatalog) -> EventCatalog {
    if !path.exists() {
        debug!(path = %path.display(), "Catalog not found, using fallback");
        return fallback();
    }

    match EventCatalog::load(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load catalog, using fallback");
            fallback()
        }
    }
}

fn report(result: &DispatchResult) -> Result<()> {
    if result.success {
        println!("✅ 发送成功");
        Ok(())
    } else {
        bail!(
            "发送失败: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        )
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let store = ConfigStore::new(cli.config.unwrap_or_else(ConfigStore::default_path));
    let catalog_path = cli.catalog.unwrap_or_else(|| store.catalog_path());
    let catalog = load_catalog(&catalog_path, || EventCatalog::new(vec![EventType::notice()]));
    let notice_catalog_path = cli
        .notice_catalog
        .unwrap_or_else(|| store.notice_catalog_path());
    let notice_types = load_catalog(&notice_catalog_path, EventCatalog::default);
    let config = store.load()?.with_env_overrides();

    let host = Arc::new(CliHost::new(store.clone()));
    let mut plugin = ServerChanPlugin::new(host, catalog).with_notice_types(notice_types);
    plugin.initialize(config)?;

    let outcome = match cli.command {
        Commands::Test => report(&plugin.send_test_message()),
        Commands::Send {
            title,
            text,
            image,
            tags,
        } => {
            let message = compose(
                MessageParts {
                    title: Some(title.as_str()),
                    text: Some(text.as_str()),
                    image: image.as_deref(),
                    tags: tags.as_deref(),
                    short: None,
                },
                plugin.config().mapper_options(),
            )
            .context("标题和内容不能同时为空")?;
            report(&plugin.send_message(&message))
        }
        Commands::Emit {
            event_type,
            payload,
        } => {
            let payload: serde_json::Value =
                serde_json::from_str(&payload).context("Invalid --payload JSON")?;
            let event = NotificationEvent::from_value(plugin.catalog().resolve(&event_type), payload)?;
            match plugin.on_event(&event) {
                Some(result) => report(&result),
                None => {
                    println!("⏭️  事件未发送（插件未启用、类型未开启或无内容）");
                    Ok(())
                }
            }
        }
        Commands::State { json } => {
            let credential = plugin.credential();
            if json {
                let state = serde_json::json!({
                    "state": plugin.state(),
                    "enabled": plugin.config().enabled,
                    "transport": plugin.config().transport,
                    "uid": credential.uid,
                    "apiUrl": credential
                        .api_url
                        .as_deref()
                        .map(|url| mask_api_url(url, plugin.config().effective_send_key())),
                });
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("状态: {}", if plugin.state() { "可用" } else { "不可用" });
                println!("启用: {}", plugin.config().enabled);
                println!("发送方式: {:?}", plugin.config().transport);
                println!("UID: {}", credential.uid.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
        Commands::Form => {
            let (elements, defaults) = plugin.form_schema();
            let form = serde_json::json!({ "elements": elements, "defaults": defaults });
            println!("{}", serde_json::to_string_pretty(&form)?);
            Ok(())
        }
        Commands::Types => {
            for t in plugin.catalog().iter() {
                println!("{:<24} {}", t.id, t.label);
            }
            Ok(())
        }
        Commands::Config => {
            let mut shown = plugin.config().clone();
            shown.send_key = mask_key(&shown.send_key);
            println!("# {}", store.path().display());
            println!("{}", serde_json::to_string_pretty(&shown)?);
            Ok(())
        }
    };

    plugin.shutdown();
    outcome
}
