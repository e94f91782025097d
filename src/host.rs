//! 宿主服务 - 配置回写与界面提示

use anyhow::Result;
use tracing::info;

use crate::config::{ConfigStore, PluginConfig};

/// 插件可调用的宿主能力
pub trait HostServices: Send + Sync {
    /// 持久化配置
    fn update_config(&self, config: &PluginConfig) -> Result<()>;

    /// 一次性界面提示
    fn system_message(&self, text: &str);
}

/// 命令行宿主：配置写回文件，提示打印到终端
pub struct CliHost {
    store: ConfigStore,
}

impl CliHost {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }
}

impl HostServices for CliHost {
    fn update_config(&self, config: &PluginConfig) -> Result<()> {
        self.store.save(config)
    }

    fn system_message(&self, text: &str) {
        info!(message = %text, "System message");
        println!("{}", text);
    }
}
