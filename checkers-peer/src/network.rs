//! 网络连接器与事件循环
//!
//! 主机监听、加入方拨号，每条链路拆成读写两个任务；
//! 所有回调都送进同一个事件通道，由 [`run_session`] 串行交给会话处理。

use std::time::Duration;

use protocol::{
    Dialer, Listener, MatchRecord, PeerId, Position, TcpConnection, TcpDialer, TcpListener,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connector::{LinkError, PeerConnector};
use crate::mode::Role;
use crate::session::{Session, SessionEvent};
use crate::world::World;

/// 拨号失败后的重试间隔
const DIAL_RETRY: Duration = Duration::from_secs(1);

/// 每隔多少次失败的拨号输出一次 info 日志
const DIAL_REPORT_EVERY: u32 = 10;

/// 链路事件
#[derive(Debug)]
pub enum LinkEvent {
    /// 链路建立，`outbound` 是该链路的发送队列
    Up {
        peer: PeerId,
        outbound: mpsc::UnboundedSender<Vec<u8>>,
    },
    /// 收到一帧
    Frame { peer: PeerId, bytes: Vec<u8> },
    /// 链路断开
    Down { peer: PeerId },
}

/// 事件循环的输入
#[derive(Debug)]
pub enum DriverEvent {
    Link(LinkEvent),
    Session(SessionEvent),
    /// 点击棋盘坐标，由当前棋盘解析成命中对象
    TapCell(Position),
    /// 打印棋盘
    ShowBoard,
    Quit,
}

/// 基于 TCP 的连接器
pub struct NetworkConnector {
    role: Role,
    addr: String,
    events: mpsc::UnboundedSender<DriverEvent>,
    link: Option<(PeerId, mpsc::UnboundedSender<Vec<u8>>)>,
}

impl NetworkConnector {
    /// 主机传入监听地址，加入方传入主机地址
    pub fn new(role: Role, addr: impl Into<String>, events: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self {
            role,
            addr: addr.into(),
            events,
            link: None,
        }
    }

    pub fn peer(&self) -> Option<PeerId> {
        self.link.as_ref().map(|(peer, _)| *peer)
    }

    /// 登记新链路；已有链路时丢弃新的，返回 false
    pub fn attach(&mut self, peer: PeerId, outbound: mpsc::UnboundedSender<Vec<u8>>) -> bool {
        if let Some((current, _)) = &self.link {
            warn!("已有对端 {}，关闭新链路 {}", current, peer);
            return false;
        }
        self.link = Some((peer, outbound));
        true
    }

    /// 移除链路
    pub fn detach(&mut self, peer: PeerId) {
        if self.peer() == Some(peer) {
            self.link = None;
        }
    }
}

impl PeerConnector for NetworkConnector {
    fn start(&mut self) {
        let addr = self.addr.clone();
        let events = self.events.clone();
        match self.role {
            Role::Host => {
                tokio::spawn(async move {
                    if let Err(e) = accept_one(&addr, events.clone()).await {
                        warn!("监听 {} 失败: {}", addr, e);
                        let failed = SessionEvent::DiscoveryFailed(format!("{}: {}", addr, e));
                        let _ = events.send(DriverEvent::Session(failed));
                    }
                });
            }
            Role::Join => {
                tokio::spawn(dial_until_connected(addr, events));
            }
        }
    }

    fn send(&mut self, peer: PeerId, data: &[u8]) -> Result<(), LinkError> {
        let Some((current, outbound)) = &self.link else {
            return Err(LinkError::NotConnected);
        };
        if *current != peer {
            return Err(LinkError::UnknownPeer(peer));
        }
        outbound.send(data.to_vec()).map_err(|_| LinkError::Closed)
    }
}

/// 主机：接受一个对端后停止监听
async fn accept_one(addr: &str, events: mpsc::UnboundedSender<DriverEvent>) -> protocol::Result<()> {
    let mut listener = TcpListener::bind(addr).await?;
    info!(
        "等待对端连接: {}",
        listener.local_addr().unwrap_or_else(|| addr.to_string())
    );
    let conn = listener.accept().await?;
    spawn_link(conn, events);
    Ok(())
}

/// 加入方：反复拨号直到连上
async fn dial_until_connected(addr: String, events: mpsc::UnboundedSender<DriverEvent>) {
    let mut attempts: u32 = 0;
    loop {
        match TcpDialer.dial(&addr).await {
            Ok(conn) => {
                info!("已连接主机 {}", addr);
                spawn_link(conn, events);
                return;
            }
            Err(e) => {
                attempts += 1;
                if is_report_attempt(attempts) {
                    info!("仍在寻找主机 {}（第 {} 次尝试）: {}", addr, attempts, e);
                } else {
                    debug!("连接 {} 失败: {}，稍后重试", addr, e);
                }
                if events.is_closed() {
                    return;
                }
                tokio::time::sleep(DIAL_RETRY).await;
            }
        }
    }
}

/// 第 1、11、21 …… 次失败时输出 info 日志
fn is_report_attempt(attempts: u32) -> bool {
    attempts % DIAL_REPORT_EVERY == 1
}

/// 为一条连接启动读写任务
fn spawn_link(conn: TcpConnection, events: mpsc::UnboundedSender<DriverEvent>) {
    let peer: PeerId = rand::random();
    let remote = protocol::Connection::peer_addr(&conn).unwrap_or_default();
    let (mut reader, mut writer) = conn.split();
    let (outbound, mut queue) = mpsc::unbounded_channel::<Vec<u8>>();

    if events.send(DriverEvent::Link(LinkEvent::Up { peer, outbound })).is_err() {
        return;
    }
    info!("链路 {} 建立 ({})", peer, remote);

    tokio::spawn(async move {
        while let Some(bytes) = queue.recv().await {
            if let Err(e) = writer.write_frame(&bytes).await {
                warn!("链路 {} 写入失败: {}", peer, e);
                break;
            }
        }
        let _ = writer.shutdown().await;
    });

    tokio::spawn(async move {
        loop {
            match reader.read_frame().await {
                Ok(bytes) => {
                    let frame = DriverEvent::Link(LinkEvent::Frame { peer, bytes });
                    if events.send(frame).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    info!("链路 {} 断开: {}", peer, e);
                    let _ = events.send(DriverEvent::Link(LinkEvent::Down { peer }));
                    break;
                }
            }
        }
    });
}

/// 事件循环：直到对局结束或收到 Quit，返回对局记录
pub async fn run_session<W: World>(
    mut session: Session<NetworkConnector, W>,
    mut events: mpsc::UnboundedReceiver<DriverEvent>,
) -> MatchRecord {
    while let Some(event) = events.recv().await {
        match event {
            DriverEvent::Link(LinkEvent::Up { peer, outbound }) => {
                if session.connector_mut().attach(peer, outbound) {
                    session.handle(SessionEvent::Connected(peer));
                }
            }
            DriverEvent::Link(LinkEvent::Frame { peer, bytes }) => {
                session.handle(SessionEvent::Received(peer, bytes));
            }
            DriverEvent::Link(LinkEvent::Down { peer }) => {
                if session.connector().peer() == Some(peer) {
                    session.connector_mut().detach(peer);
                    session.handle(SessionEvent::Disconnected(peer));
                }
            }
            DriverEvent::Session(event) => session.handle(event),
            DriverEvent::TapCell(pos) => {
                let hit = session.controller().resolve_hit(pos);
                session.handle(SessionEvent::Tap(hit));
            }
            DriverEvent::ShowBoard => {
                let controller = session.controller();
                println!("{}", controller.board());
                println!("mode: {}  side: {}", session.mode(), session.local_side());
                if let Some(taken) = controller.taken().and_then(Position::from_index) {
                    println!("taken: {}", taken);
                    for mv in controller.moves() {
                        println!("  {}", mv);
                    }
                }
            }
            DriverEvent::Quit => {
                info!("退出");
                break;
            }
        }

        if session.mode().is_ended() {
            break;
        }
    }

    session.record().clone()
}
