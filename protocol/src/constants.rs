//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘边长（行列数相同）
pub const BOARD_SIZE: usize = 8;

/// 棋盘格子总数
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// 白方起始占据的行数（j < 3）
pub const WHITE_HOME_ROWS: u8 = 3;

/// 黑方起始行下界（j > 4）
pub const BLACK_HOME_FROM: u8 = 5;

/// 消息帧最大大小（世界快照可能较大）
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 9528;

/// GameStart 默认问候语
pub const DEFAULT_GREETING: &str = "Hello, let's play checkers";
