//! 消息类型定义
//!
//! 对端之间交换的五种消息，使用带 `type` 标签的 JSON 编码。

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::piece::Position;

/// 对端 ID
pub type PeerId = u64;

/// 世界坐标（棋盘在宿主空间中的放置位置）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 编码为 Init 消息中的不透明字节
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// 从 Init 消息中的不透明字节解码
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.3}, {:.3}, {:.3}]", self.x, self.y, self.z)
    }
}

/// 环境快照（不透明字节，由外部环境跟踪能力产生）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSnapshot(pub Vec<u8>);

impl WorldSnapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 对端之间交换的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMessage {
    /// 主机 -> 加入方，仅一次：环境快照与棋盘位置
    Init {
        world_snapshot: Option<WorldSnapshot>,
        board_position: Vec<u8>,
    },
    /// 加入方 -> 主机：重定位完成
    JoinSetupFinished { succeeded: bool },
    /// 主机 -> 加入方，随后由加入方原样回送
    GameStart { greeting: String },
    /// 拿起棋子（起始格）
    Took { i: i32, j: i32 },
    /// 放下棋子（目标格）
    Place { i: i32, j: i32 },
}

impl PeerMessage {
    /// 构造 Init 消息
    pub fn init(world_snapshot: Option<WorldSnapshot>, board_position: Vec3) -> Result<Self> {
        Ok(PeerMessage::Init {
            world_snapshot,
            board_position: board_position.to_bytes()?,
        })
    }

    pub fn took(pos: Position) -> Self {
        PeerMessage::Took {
            i: pos.i as i32,
            j: pos.j as i32,
        }
    }

    pub fn place(pos: Position) -> Self {
        PeerMessage::Place {
            i: pos.i as i32,
            j: pos.j as i32,
        }
    }

    /// 消息类型名称（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            PeerMessage::Init { .. } => "init",
            PeerMessage::JoinSetupFinished { .. } => "join_setup_finished",
            PeerMessage::GameStart { .. } => "game_start",
            PeerMessage::Took { .. } => "took",
            PeerMessage::Place { .. } => "place",
        }
    }

    /// 编码为字节
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// 从字节解码
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
