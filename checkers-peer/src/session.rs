//! 会话状态机
//!
//! 一个会话对应一端的一局对局。所有输入（本地点击、环境报告、连接回调、
//! 收到的消息）都通过 [`Session::handle`] 在同一个任务里串行处理。
//!
//! 主机执白、加入方执黑。`White`/`Black` 模式表示当前轮到哪一方：
//! 轮到本方时响应本地点击并广播 Took/Place，轮到对方时把收到的
//! Took/Place 在本地棋盘上镜像执行。

use protocol::{MatchEnd, MatchRecord, PeerId, PeerMessage, Position, Side, Vec3, WorldSnapshot};
use tracing::{debug, info, warn};

use crate::connector::PeerConnector;
use crate::controller::{BoardController, HitTarget};
use crate::mode::{Mode, Role};
use crate::world::{MappingQuality, World};

/// 会话输入事件
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// 界面变为活动状态
    Activated,
    /// 本地点击（已由命中检测解析）
    Tap(HitTarget),
    /// 环境报告，`generation` 为发起采集时的会话代数
    WorldReport {
        generation: u64,
        quality: MappingQuality,
        snapshot: Option<WorldSnapshot>,
    },
    /// 对端已连接
    Connected(PeerId),
    /// 对端已断开
    Disconnected(PeerId),
    /// 收到对端数据
    Received(PeerId, Vec<u8>),
    /// 连接器无法开始发现对端（例如监听地址被占用）
    DiscoveryFailed(String),
}

/// 会话
pub struct Session<C, W> {
    role: Role,
    mode: Mode,
    /// 每次模式切换加一，用于丢弃过期的环境报告
    generation: u64,
    controller: BoardController,
    connector: C,
    world: W,
    peer: Option<PeerId>,
    discovery_started: bool,
    board_position: Option<Vec3>,
    greeting: String,
    outcome: Option<Side>,
    record: MatchRecord,
}

impl<C: PeerConnector, W: World> Session<C, W> {
    /// 创建主机会话
    pub fn host(connector: C, world: W, greeting: impl Into<String>) -> Self {
        Self::new(Role::Host, connector, world, greeting.into())
    }

    /// 创建加入方会话
    pub fn join(connector: C, world: W) -> Self {
        Self::new(Role::Join, connector, world, String::new())
    }

    fn new(role: Role, connector: C, world: W, greeting: String) -> Self {
        Self {
            role,
            mode: role.initial_mode(),
            generation: 0,
            controller: BoardController::new(),
            connector,
            world,
            peer: None,
            discovery_started: false,
            board_position: None,
            greeting,
            outcome: None,
            record: MatchRecord::new(role.side()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn controller(&self) -> &BoardController {
        &self.controller
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn peer(&self) -> Option<PeerId> {
        self.peer
    }

    /// 检测到的胜方
    pub fn outcome(&self) -> Option<Side> {
        self.outcome
    }

    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    /// 本端执子方
    pub fn local_side(&self) -> Side {
        self.role.side()
    }

    /// 处理一个事件
    pub fn handle(&mut self, event: SessionEvent) {
        if self.mode.is_ended() {
            debug!("对局已结束，忽略事件 {:?}", event);
            return;
        }

        match event {
            SessionEvent::Activated => self.on_activated(),
            SessionEvent::Tap(hit) => self.on_tap(hit),
            SessionEvent::WorldReport {
                generation,
                quality,
                snapshot,
            } => self.on_world_report(generation, quality, snapshot),
            SessionEvent::Connected(peer) => self.on_connected(peer),
            SessionEvent::Disconnected(peer) => self.on_disconnected(peer),
            SessionEvent::Received(peer, data) => self.on_receive(peer, &data),
            SessionEvent::DiscoveryFailed(reason) => self.on_discovery_failed(&reason),
        }
    }

    /// 切换模式，不在转换表中的切换会被拒绝
    fn transition(&mut self, to: Mode) -> bool {
        if !self.mode.can_transition(&to, self.role) {
            warn!("拒绝模式切换 {} -> {} ({})", self.mode, to, self.role);
            return false;
        }
        info!("模式切换 {} -> {} ({})", self.mode, to, self.role);
        self.mode = to;
        self.generation += 1;
        true
    }

    /// 发送消息；发送失败视为对端断开
    fn send(&mut self, msg: &PeerMessage) -> bool {
        let Some(peer) = self.peer else {
            warn!("没有对端，无法发送 {}", msg.kind());
            return false;
        };
        let data = match msg.encode() {
            Ok(data) => data,
            Err(e) => {
                warn!("编码消息 {} 失败: {}", msg.kind(), e);
                return false;
            }
        };
        match self.connector.send(peer, &data) {
            Ok(()) => {
                debug!("已发送 {} 到 {}", msg.kind(), peer);
                true
            }
            Err(e) => {
                warn!("发送 {} 失败: {}，按断开处理", msg.kind(), e);
                self.on_disconnected(peer);
                false
            }
        }
    }

    fn start_discovery(&mut self) {
        if self.discovery_started {
            return;
        }
        self.discovery_started = true;
        self.connector.start();
    }

    // ------------------------------------------------------------------
    // 本地输入
    // ------------------------------------------------------------------

    fn on_activated(&mut self) {
        match (self.role, &self.mode) {
            (Role::Host, Mode::InitializingWorld) => {
                self.world.start_tracking(None);
                self.world.show_notice("Track the world and place checkerboard");
            }
            (Role::Join, Mode::AwaitHostSetup) => {
                self.start_discovery();
                self.world.show_notice("Looking for a host");
            }
            _ => {}
        }
    }

    fn on_tap(&mut self, hit: HitTarget) {
        match (&self.mode, hit) {
            (Mode::InitializingWorld, HitTarget::Surface(position)) => {
                self.world.place_board(position);
                self.board_position = Some(position);
                if self.transition(Mode::PreparingWorld) {
                    self.world.show_notice("Preparing world");
                    self.world.begin_capture(self.generation);
                }
            }
            (Mode::White | Mode::Black, _) => self.on_play_tap(hit),
            (mode, hit) => debug!("{} 模式下忽略点击 {:?}", mode, hit),
        }
    }

    fn on_play_tap(&mut self, hit: HitTarget) {
        let local = self.local_side();
        if self.mode.turn() != Some(local) {
            debug!("不是本方回合，忽略点击");
            return;
        }

        match hit {
            HitTarget::Checker(index) => {
                if self.controller.board().side_at(index) != Some(local) {
                    debug!("不能拿起对方棋子");
                    return;
                }
                let Some(pos) = Position::from_index(index) else {
                    return;
                };
                self.controller.select(index);
                self.send(&PeerMessage::took(pos));
            }
            HitTarget::Cell(index) => {
                if !self.controller.attempt_place(index) {
                    debug!("格子 {} 不是合法落点", index);
                    return;
                }
                let Some(pos) = Position::from_index(index) else {
                    return;
                };
                if self.send(&PeerMessage::place(pos)) {
                    self.finish_ply(local);
                }
            }
            HitTarget::Surface(_) | HitTarget::None => {}
        }
    }

    /// 一手完成：记录、判胜，然后交换回合
    fn finish_ply(&mut self, mover: Side) {
        if let Some(mv) = self.controller.last_move() {
            self.record.push(mover, mv);
        }

        if self.controller.is_win(mover) {
            info!("{} 获胜", mover);
            self.outcome = Some(mover);
            self.record.finish(MatchEnd::Win(mover));
            let notice = if mover == self.local_side() {
                "You win!"
            } else {
                "You lose"
            };
            self.world.show_notice(notice);
        }

        self.transition(Mode::for_turn(mover.opponent()));
    }

    // ------------------------------------------------------------------
    // 环境报告
    // ------------------------------------------------------------------

    fn on_world_report(
        &mut self,
        generation: u64,
        quality: MappingQuality,
        snapshot: Option<WorldSnapshot>,
    ) {
        if generation != self.generation {
            debug!(
                "丢弃过期的环境报告 (generation {} != {})",
                generation, self.generation
            );
            return;
        }

        match &self.mode {
            Mode::PreparingWorld => {
                if !quality.is_adequate() {
                    self.world.show_notice("World map is not good enough to share yet");
                    return;
                }
                let Some(position) = self.board_position else {
                    warn!("棋盘尚未放置");
                    return;
                };
                let pending_init = match PeerMessage::init(snapshot, position) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("构造 Init 消息失败: {}", e);
                        return;
                    }
                };
                if self.transition(Mode::AwaitingConnection { pending_init }) {
                    self.world.show_notice("Awaiting connections");
                    self.start_discovery();
                }
            }
            Mode::RelocalizeWorld { board_position, .. } => {
                if !quality.is_adequate() {
                    self.world.show_notice("Relocalizing, keep scanning the host's area");
                    return;
                }
                let position = *board_position;
                self.world.place_board(position);
                self.board_position = Some(position);
                if self.transition(Mode::NotifySetupFinish) {
                    self.send(&PeerMessage::JoinSetupFinished { succeeded: true });
                }
            }
            mode => debug!("{} 模式下忽略环境报告", mode),
        }
    }

    // ------------------------------------------------------------------
    // 连接回调
    // ------------------------------------------------------------------

    fn on_connected(&mut self, peer: PeerId) {
        if let Some(current) = self.peer {
            if current != peer {
                warn!("已连接 {}，忽略新的对端 {}", current, peer);
            }
            return;
        }

        info!("对端 {} 已连接", peer);
        self.peer = Some(peer);

        match &self.mode {
            Mode::AwaitingConnection { pending_init } => {
                let msg = pending_init.clone();
                if self.send(&msg) {
                    self.transition(Mode::SetupJoined);
                }
            }
            Mode::AwaitHostSetup => self.world.show_notice("Connected, waiting for host setup"),
            _ => {}
        }
    }

    fn on_discovery_failed(&mut self, reason: &str) {
        warn!("无法发现对端: {}", reason);
        if self.peer.is_some() {
            return;
        }
        self.world
            .show_notice(&format!("Could not wait for a peer: {}", reason));
        self.transition(Mode::Ended);
    }

    fn on_disconnected(&mut self, peer: PeerId) {
        if self.peer.is_some_and(|current| current != peer) {
            debug!("忽略非当前对端 {} 的断开", peer);
            return;
        }

        info!("对端 {} 已断开", peer);
        self.peer = None;
        self.record.finish(MatchEnd::Disconnected);
        if self.transition(Mode::Ended) {
            self.world.show_notice("Peer disconnected, match aborted");
        }
    }

    // ------------------------------------------------------------------
    // 收到消息
    // ------------------------------------------------------------------

    fn on_receive(&mut self, peer: PeerId, data: &[u8]) {
        if self.peer != Some(peer) {
            warn!("忽略来自未知对端 {} 的数据", peer);
            return;
        }

        let msg = match PeerMessage::decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("无法解码消息 ({} 字节): {}", data.len(), e);
                return;
            }
        };
        debug!("收到 {} ({})", msg.kind(), self.mode);

        match (self.role, &self.mode, msg) {
            (Role::Host, Mode::SetupJoined, PeerMessage::JoinSetupFinished { succeeded }) => {
                if !succeeded {
                    self.world.show_notice("Peer failed to set up the world");
                    return;
                }
                let start = PeerMessage::GameStart {
                    greeting: self.greeting.clone(),
                };
                if self.send(&start) {
                    self.transition(Mode::AwaitJoinedSetup);
                }
            }
            (Role::Host, Mode::AwaitJoinedSetup, PeerMessage::GameStart { greeting }) => {
                self.record.metadata.greeting = Some(greeting);
                if self.transition(Mode::White) {
                    self.world.show_notice("Game started, your move");
                }
            }
            (
                Role::Join,
                Mode::AwaitHostSetup,
                PeerMessage::Init {
                    world_snapshot,
                    board_position,
                },
            ) => {
                let position = match Vec3::from_bytes(&board_position) {
                    Ok(position) => position,
                    Err(e) => {
                        warn!("Init 中的棋盘位置无效: {}", e);
                        return;
                    }
                };
                self.world.start_tracking(world_snapshot.as_ref());
                let relocalize = Mode::RelocalizeWorld {
                    snapshot: world_snapshot,
                    board_position: position,
                };
                if self.transition(relocalize) {
                    self.world.show_notice("Relocalizing to the host's world");
                    self.world.begin_capture(self.generation);
                }
            }
            (Role::Join, Mode::NotifySetupFinish, PeerMessage::GameStart { greeting }) => {
                let echo = PeerMessage::GameStart {
                    greeting: greeting.clone(),
                };
                if self.send(&echo) {
                    self.record.metadata.greeting = Some(greeting);
                    if self.transition(Mode::White) {
                        self.world.show_notice("Game started, waiting for White");
                    }
                }
            }
            (_, Mode::White | Mode::Black, PeerMessage::Took { i, j }) => self.on_remote_took(i, j),
            (_, Mode::White | Mode::Black, PeerMessage::Place { i, j }) => {
                self.on_remote_place(i, j)
            }
            (_, mode, msg) => warn!("{} 模式下忽略消息 {}", mode, msg.kind()),
        }
    }

    /// 对端回合中的坐标；不在对端回合或坐标无效时返回 None
    fn remote_turn_index(&self, i: i32, j: i32) -> Option<(Side, usize)> {
        let remote = self.local_side().opponent();
        if self.mode.turn() != Some(remote) {
            warn!("不是对端回合，忽略对端操作 ({}, {})", i, j);
            return None;
        }
        let Some(pos) = Position::from_coords(i, j) else {
            warn!("对端坐标越界 ({}, {})", i, j);
            return None;
        };
        Some((remote, pos.to_index()))
    }

    fn on_remote_took(&mut self, i: i32, j: i32) {
        let Some((remote, index)) = self.remote_turn_index(i, j) else {
            return;
        };
        if self.controller.board().side_at(index) != Some(remote) {
            warn!("对端拿起的 ({}, {}) 不是对端棋子", i, j);
            return;
        }
        self.controller.select(index);
    }

    fn on_remote_place(&mut self, i: i32, j: i32) {
        let Some((remote, index)) = self.remote_turn_index(i, j) else {
            return;
        };
        if !self.controller.attempt_place(index) {
            warn!("对端落子 ({}, {}) 在本地棋盘上不合法", i, j);
            return;
        }
        self.finish_ply(remote);
    }
}
