//! 插件配置与文件存储
//!
//! 配置文件位于 `~/.config/serverchan-notify/config.json`（JSON，camelCase 字段）。
//! 环境变量 `SERVERCHAN_SENDKEY` 优先于文件中的 `sendKey`。

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::notification::transport::{TransportShape, DEFAULT_TIMEOUT_SECS};
use crate::notification::{ChannelCredential, MapperOptions, TypeFilter};

/// SendKey 环境变量
pub const SENDKEY_ENV: &str = "SERVERCHAN_SENDKEY";

/// 插件配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    /// 启用插件
    pub enabled: bool,
    /// SendKey
    pub send_key: String,
    /// UID（可从 SendKey 推导）
    pub uid: String,
    /// API URL（可从 UID + SendKey 推导）
    pub api_url: String,
    /// 启用的事件类型 id，空表示不限制
    pub enabled_types: Vec<String>,
    /// 通用通知消息中允许的 `type` 值，空表示不限制
    pub enabled_notice_types: Vec<String>,
    /// 发送图片
    pub send_image_enabled: bool,
    /// 立刻发送测试（一次性，运行后自动关闭）
    pub send_test_now: bool,
    /// 发送方式
    pub transport: TransportShape,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 环境变量提供的 SendKey，只参与发送，不写回配置文件
    #[serde(skip)]
    pub send_key_override: Option<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            send_key: String::new(),
            uid: String::new(),
            api_url: String::new(),
            enabled_types: Vec::new(),
            enabled_notice_types: Vec::new(),
            send_image_enabled: false,
            send_test_now: false,
            transport: TransportShape::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            send_key_override: None,
        }
    }
}

impl PluginConfig {
    /// 应用环境变量覆盖
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(SENDKEY_ENV) {
            Ok(key) if !key.trim().is_empty() => {
                debug!("Using {} from environment", SENDKEY_ENV);
                self.with_send_key_override(key)
            }
            _ => self,
        }
    }

    /// 设置运行时 SendKey（不持久化）
    pub fn with_send_key_override(mut self, key: impl Into<String>) -> Self {
        let key = key.into().trim().to_string();
        self.send_key_override = Some(key).filter(|k| !k.is_empty());
        self
    }

    /// 实际用于发送的 SendKey
    pub fn effective_send_key(&self) -> &str {
        self.send_key_override.as_deref().unwrap_or(&self.send_key)
    }

    /// 请求超时
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// 构建渠道凭据
    pub fn credential(&self) -> ChannelCredential {
        ChannelCredential::new(
            self.effective_send_key(),
            Some(self.uid.clone()),
            Some(self.api_url.clone()),
        )
    }

    /// 构建事件过滤器
    pub fn type_filter(&self) -> TypeFilter {
        TypeFilter::new(
            self.enabled_types.iter().cloned(),
            self.enabled_notice_types.iter().cloned(),
        )
    }

    /// 映射选项
    pub fn mapper_options(&self) -> MapperOptions {
        MapperOptions {
            send_image_enabled: self.send_image_enabled,
        }
    }
}

/// 隐藏密钥中间部分，用于展示
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}

/// 隐藏 API URL 中的 SendKey 部分
pub fn mask_api_url(api_url: &str, send_key: &str) -> String {
    if send_key.is_empty() {
        return api_url.to_string();
    }
    api_url.replace(send_key, &mask_key(send_key))
}

/// 配置文件存储
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// 创建存储
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 默认配置目录
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("serverchan-notify")
    }

    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        Self::default_dir().join("config.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 事件类型目录文件（与配置文件同目录）
    pub fn catalog_path(&self) -> PathBuf {
        self.path
            .parent()
            .map(|p| p.join("event_types.json"))
            .unwrap_or_else(|| PathBuf::from("event_types.json"))
    }

    /// 通知消息类型目录文件（与配置文件同目录）
    pub fn notice_catalog_path(&self) -> PathBuf {
        self.path
            .parent()
            .map(|p| p.join("notice_types.json"))
            .unwrap_or_else(|| PathBuf::from("notice_types.json"))
    }

    /// 读取配置；文件不存在时返回默认配置
    pub fn load(&self) -> Result<PluginConfig> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Config file not found, using defaults");
            return Ok(PluginConfig::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read config {}", self.path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", self.path.display()))?;
        Ok(config)
    }

    /// 写入配置（带文件锁）
    pub fn save(&self, config: &PluginConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("Cannot open config {}", self.path.display()))?;

        file.lock_exclusive()?;
        let mut file = file;
        file.set_len(0)?;
        writeln!(file, "{}", content)?;
        file.unlock()?;

        debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}
