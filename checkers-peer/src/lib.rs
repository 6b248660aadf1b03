//! 点对点跳棋对端
//!
//! 包含:
//! - 棋盘控制器（选子、落子、判胜）
//! - 主机/加入方会话状态机
//! - TCP 连接器与事件循环
//! - 模拟环境跟踪
//! - 配置与对局记录存储

pub mod cli;
pub mod config;
pub mod connector;
pub mod controller;
pub mod input;
pub mod mode;
pub mod network;
pub mod session;
pub mod storage;
pub mod world;

pub use config::PeerConfig;
pub use connector::{LinkError, PeerConnector};
pub use controller::{BoardController, HitTarget};
pub use mode::{Mode, Role};
pub use network::{run_session, DriverEvent, LinkEvent, NetworkConnector};
pub use session::{Session, SessionEvent};
pub use storage::{RecordInfo, StorageManager};
pub use world::{MappingQuality, SimulatedWorld, World};
