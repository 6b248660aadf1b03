//! 错误类型定义

use thiserror::Error;

/// 跳棋规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// 无效的位置
    #[error("Invalid position: ({i}, {j})")]
    InvalidPosition { i: i8, j: i8 },

    /// 无效的格子索引
    #[error("Invalid cell index: {0}")]
    InvalidIndex(usize),

    /// 棋子只能放在黑格
    #[error("Cell ({i}, {j}) is not a black cell")]
    NotBlackCell { i: u8, j: u8 },

    /// 格子已被占据
    #[error("Cell ({i}, {j}) is already occupied")]
    Occupied { i: u8, j: u8 },

    /// 没有棋子
    #[error("No checker at position ({i}, {j})")]
    NoChecker { i: u8, j: u8 },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误（bincode）
    #[error("Bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
