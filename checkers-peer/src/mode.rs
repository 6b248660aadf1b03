//! 会话模式
//!
//! 主机与加入方各自的状态自动机，以及转换合法性检查。

use protocol::{PeerMessage, Side, Vec3, WorldSnapshot};

/// 对端角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// 主机：放置棋盘、广播环境快照，执白
    Host,
    /// 加入方：接收快照重定位，执黑
    Join,
}

impl Role {
    /// 本端执子方
    pub fn side(&self) -> Side {
        match self {
            Role::Host => Side::White,
            Role::Join => Side::Black,
        }
    }

    /// 初始模式
    pub fn initial_mode(&self) -> Mode {
        match self {
            Role::Host => Mode::InitializingWorld,
            Role::Join => Mode::AwaitHostSetup,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Join => f.write_str("join"),
        }
    }
}

/// 会话模式
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// 主机：等待点击放置棋盘
    InitializingWorld,
    /// 主机：等待环境快照质量足够
    PreparingWorld,
    /// 主机：等待对端连接，连接后发送暂存的 Init
    AwaitingConnection { pending_init: PeerMessage },
    /// 主机：Init 已发送，等待加入方重定位完成
    SetupJoined,
    /// 主机：GameStart 已发送，等待回送
    AwaitJoinedSetup,
    /// 加入方：等待主机的 Init
    AwaitHostSetup,
    /// 加入方：使用收到的快照重定位
    RelocalizeWorld {
        snapshot: Option<WorldSnapshot>,
        board_position: Vec3,
    },
    /// 加入方：已通知主机，等待 GameStart
    NotifySetupFinish,
    /// 白方回合
    White,
    /// 黑方回合
    Black,
    /// 对局中止（断开连接）
    Ended,
}

impl Mode {
    /// 当前回合方（非对局阶段为 None）
    pub fn turn(&self) -> Option<Side> {
        match self {
            Mode::White => Some(Side::White),
            Mode::Black => Some(Side::Black),
            _ => None,
        }
    }

    /// 回合方对应的模式
    pub fn for_turn(side: Side) -> Mode {
        match side {
            Side::White => Mode::White,
            Side::Black => Mode::Black,
        }
    }

    /// 模式名称（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Mode::InitializingWorld => "InitializingWorld",
            Mode::PreparingWorld => "PreparingWorld",
            Mode::AwaitingConnection { .. } => "AwaitingConnection",
            Mode::SetupJoined => "SetupJoined",
            Mode::AwaitJoinedSetup => "AwaitJoinedSetup",
            Mode::AwaitHostSetup => "AwaitHostSetup",
            Mode::RelocalizeWorld { .. } => "RelocalizeWorld",
            Mode::NotifySetupFinish => "NotifySetupFinish",
            Mode::White => "White",
            Mode::Black => "Black",
            Mode::Ended => "Ended",
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Mode::Ended)
    }

    /// 检查 `self -> to` 对于 `role` 是否合法
    ///
    /// 任意模式都可以因断开而进入 Ended，Ended 之后不再转换。
    pub fn can_transition(&self, to: &Mode, role: Role) -> bool {
        use Mode::*;

        if self.is_ended() {
            return false;
        }
        if to.is_ended() {
            return true;
        }

        match role {
            Role::Host => matches!(
                (self, to),
                (InitializingWorld, PreparingWorld)
                    | (PreparingWorld, AwaitingConnection { .. })
                    | (AwaitingConnection { .. }, SetupJoined)
                    | (SetupJoined, AwaitJoinedSetup)
                    | (AwaitJoinedSetup, White)
                    | (White, Black)
                    | (Black, White)
            ),
            Role::Join => matches!(
                (self, to),
                (AwaitHostSetup, RelocalizeWorld { .. })
                    | (RelocalizeWorld { .. }, NotifySetupFinish)
                    | (NotifySetupFinish, White)
                    | (White, Black)
                    | (Black, White)
            ),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_modes() -> Vec<Mode> {
        vec![
            Mode::InitializingWorld,
            Mode::PreparingWorld,
            Mode::AwaitingConnection {
                pending_init: PeerMessage::GameStart {
                    greeting: String::new(),
                },
            },
            Mode::SetupJoined,
            Mode::AwaitJoinedSetup,
            Mode::AwaitHostSetup,
            Mode::RelocalizeWorld {
                snapshot: None,
                board_position: Vec3::default(),
            },
            Mode::NotifySetupFinish,
            Mode::White,
            Mode::Black,
            Mode::Ended,
        ]
    }

    fn allowed_pairs(role: Role) -> Vec<(&'static str, &'static str)> {
        let modes = all_modes();
        let mut pairs = Vec::new();
        for from in &modes {
            for to in &modes {
                if from.can_transition(to, role) && !to.is_ended() {
                    pairs.push((from.name(), to.name()));
                }
            }
        }
        pairs
    }

    #[test]
    fn test_host_automaton() {
        assert_eq!(
            allowed_pairs(Role::Host),
            vec![
                ("InitializingWorld", "PreparingWorld"),
                ("PreparingWorld", "AwaitingConnection"),
                ("AwaitingConnection", "SetupJoined"),
                ("SetupJoined", "AwaitJoinedSetup"),
                ("AwaitJoinedSetup", "White"),
                ("White", "Black"),
                ("Black", "White"),
            ]
        );
    }

    #[test]
    fn test_join_automaton() {
        assert_eq!(
            allowed_pairs(Role::Join),
            vec![
                ("AwaitHostSetup", "RelocalizeWorld"),
                ("RelocalizeWorld", "NotifySetupFinish"),
                ("NotifySetupFinish", "White"),
                ("White", "Black"),
                ("Black", "White"),
            ]
        );
    }

    #[test]
    fn test_ended_is_terminal() {
        for role in [Role::Host, Role::Join] {
            for from in all_modes() {
                assert_eq!(from.can_transition(&Mode::Ended, role), !from.is_ended());
                assert!(!Mode::Ended.can_transition(&from, role));
            }
        }
    }

    #[test]
    fn test_role_sides() {
        assert_eq!(Role::Host.side(), Side::White);
        assert_eq!(Role::Join.side(), Side::Black);
        assert_eq!(Role::Host.initial_mode(), Mode::InitializingWorld);
        assert_eq!(Role::Join.initial_mode(), Mode::AwaitHostSetup);
    }
}
