//! 对端连接器抽象
//!
//! 会话只依赖这个同步接口；连接、断开、收到数据等回调以
//! [`SessionEvent`](crate::session::SessionEvent) 的形式送回会话所在的任务。

use protocol::PeerId;
use thiserror::Error;

/// 发送失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// 还没有连上任何对端
    #[error("No peer connected")]
    NotConnected,

    /// 目标不是当前连接的对端
    #[error("Unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// 链路已关闭
    #[error("Link closed")]
    Closed,
}

/// 对端连接器
pub trait PeerConnector {
    /// 开始发现对端（主机开始监听，加入方开始拨号）
    fn start(&mut self);

    /// 可靠有序地向对端发送一条完整消息
    fn send(&mut self, peer: PeerId, data: &[u8]) -> Result<(), LinkError>;
}
