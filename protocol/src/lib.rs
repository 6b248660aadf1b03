//! 跳棋共享协议库
//!
//! 包含:
//! - 棋子、格子、棋盘等核心数据结构
//! - 走法生成（含连跳搜索）
//! - 对端消息类型定义 (PeerMessage)
//! - 传输层抽象 (Dialer, Connection, Listener traits) 与帧编解码
//! - 对局记录格式 (JSON)

mod board;
mod constants;
mod error;
mod message;
mod moves;
mod piece;
mod record;
mod transport;

pub use board::Board;
pub use constants::*;
pub use error::{ProtocolError, Result, RuleError};
pub use message::{PeerId, PeerMessage, Vec3, WorldSnapshot};
pub use moves::{allowed_destinations, Move, MoveGenerator, Step};
pub use piece::{Cell, Checker, Position, Side};
pub use record::{MatchEnd, MatchMetadata, MatchRecord, PlyRecord, RECORD_VERSION};
pub use transport::{
    Connection, Dialer, Listener,
    TcpConnection, TcpDialer, TcpListener,
    FrameReader, FrameWriter,
};
