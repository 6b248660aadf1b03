//! 命令行参数

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::PeerConfig;

/// 双人点对点跳棋
#[derive(Parser, Debug)]
#[command(name = "checkers-peer")]
#[command(about = "Peer-to-peer checkers over a shared board", long_about = None)]
#[command(version)]
pub struct Cli {
    /// 配置文件路径（默认 <config_dir>/checkers/config.json）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 对局结束后不保存记录
    #[arg(long, global = true)]
    pub no_record: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 作为主机（执白）放置棋盘并等待对端
    Host {
        /// 监听地址
        #[arg(short, long)]
        listen: Option<String>,

        /// GameStart 问候语
        #[arg(short, long)]
        greeting: Option<String>,
    },

    /// 作为加入方（执黑）连接主机
    Join {
        /// 主机地址
        #[arg(long)]
        host: Option<String>,
    },

    /// 列出保存的对局记录
    Records,

    /// 打印一条对局记录
    Show {
        /// 记录 ID（文件名）
        record_id: String,
    },
}

impl Cli {
    /// 读取配置文件并应用命令行覆盖
    pub fn resolve_config(&self) -> PeerConfig {
        let mut config = match &self.config {
            Some(path) => PeerConfig::load_from(path),
            None => PeerConfig::load(),
        };

        match &self.command {
            Command::Host { listen, greeting } => {
                if let Some(listen) = listen {
                    config.listen_addr = listen.clone();
                }
                if let Some(greeting) = greeting {
                    config.greeting = greeting.clone();
                }
            }
            Command::Join { host } => {
                if let Some(host) = host {
                    config.host_addr = host.clone();
                }
            }
            Command::Records | Command::Show { .. } => {}
        }
        if self.no_record {
            config.save_records = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_host_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let path_arg = path.to_str().unwrap();

        let cli = parse(&[
            "checkers-peer",
            "--config",
            path_arg,
            "host",
            "--listen",
            "127.0.0.1:7000",
            "-g",
            "gl hf",
        ]);
        let config = cli.resolve_config();
        assert_eq!(config.listen_addr, "127.0.0.1:7000");
        assert_eq!(config.greeting, "gl hf");
        assert!(config.save_records);
    }

    #[test]
    fn test_join_uses_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "host_addr": "192.168.1.5:9528" }"#).unwrap();
        let path_arg = path.to_str().unwrap();

        let cli = parse(&["checkers-peer", "join", "--config", path_arg, "--no-record"]);
        let config = cli.resolve_config();
        assert_eq!(config.host_addr, "192.168.1.5:9528");
        assert!(!config.save_records);
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["checkers-peer"]).is_err());
    }
}
