//! 对端配置
//!
//! JSON 文件保存在 `<config_dir>/checkers/config.json`，缺失或无效时使用默认值。

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use protocol::{DEFAULT_GREETING, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

/// 对端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// 主机监听地址
    pub listen_addr: String,
    /// 加入方连接的主机地址
    pub host_addr: String,
    /// 主机在 GameStart 中发送的问候语
    pub greeting: String,
    /// 对局结束后是否保存记录
    pub save_records: bool,
    /// 模拟环境的报告间隔（毫秒）
    pub world_report_interval_ms: u64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            host_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            greeting: DEFAULT_GREETING.to_string(),
            save_records: true,
            world_report_interval_ms: 500,
        }
    }
}

impl PeerConfig {
    /// 默认配置文件路径
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("checkers");
            path.push("config.json");
            path
        })
    }

    /// 从默认路径加载
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("无法获取配置目录，使用默认配置");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// 从指定路径加载
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("配置文件不存在，使用默认配置");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    tracing::info!("已加载配置: {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("配置文件格式无效: {}，使用默认配置", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("无法读取配置文件: {}，使用默认配置", e);
                Self::default()
            }
        }
    }

    /// 保存到指定路径
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("无法创建配置目录")?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("无法写入配置文件 {:?}", path))?;
        Ok(())
    }

    pub fn world_report_interval(&self) -> Duration {
        Duration::from_millis(self.world_report_interval_ms)
    }
}
