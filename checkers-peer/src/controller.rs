//! 棋盘控制器
//!
//! 串起“选子 -> 计算合法落点 -> 落子 -> 判胜”。
//! 选中状态只保存选中格子和对应的走法，高亮只是从中派生的投影。

use std::cmp::Reverse;
use std::collections::BTreeSet;

use protocol::{allowed_destinations, Board, Move, MoveGenerator, Position, Side, Vec3};
use tracing::{debug, warn};

/// 点击命中的对象（由外部命中检测解析）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// 命中某个格子上的棋子
    Checker(usize),
    /// 命中空格子
    Cell(usize),
    /// 命中检测到的平面（用于放置棋盘）
    Surface(Vec3),
    /// 什么也没命中
    None,
}

/// 棋盘控制器
#[derive(Debug, Clone)]
pub struct BoardController {
    board: Board,
    /// 当前拿起的棋子所在格子
    taken: Option<usize>,
    /// 拿起棋子的全部走法
    moves: Vec<Move>,
    /// 最近一次落子执行的走法（用于展示移动过程）
    last_move: Option<Move>,
}

impl BoardController {
    /// 使用初始棋盘创建
    pub fn new() -> Self {
        Self::with_board(Board::initial())
    }

    /// 使用指定棋盘创建
    pub fn with_board(board: Board) -> Self {
        Self {
            board,
            taken: None,
            moves: Vec::new(),
            last_move: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn taken(&self) -> Option<usize> {
        self.taken
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    /// 当前合法落点集合
    pub fn allowed(&self) -> BTreeSet<usize> {
        allowed_destinations(&self.moves)
    }

    /// 需要高亮的格子
    pub fn highlighted(&self) -> BTreeSet<usize> {
        self.allowed()
    }

    /// 把棋盘坐标解析为命中对象
    pub fn resolve_hit(&self, pos: Position) -> HitTarget {
        let index = pos.to_index();
        if self.board.is_occupied(index) {
            HitTarget::Checker(index)
        } else {
            HitTarget::Cell(index)
        }
    }

    /// 拿起棋子并计算走法
    ///
    /// 格子上没有棋子时不改变任何状态，返回空列表。
    pub fn select(&mut self, index: usize) -> &[Move] {
        if !self.board.is_occupied(index) {
            return &[];
        }

        self.taken = Some(index);
        self.moves = MoveGenerator::legal_moves(&self.board, index);
        debug!(
            "选中 {:?}，共 {} 个走法",
            Position::from_index(index),
            self.moves.len()
        );
        &self.moves
    }

    /// 取消选中
    pub fn clear_selection(&mut self) {
        self.taken = None;
        self.moves.clear();
    }

    /// 尝试把拿起的棋子放到指定格子
    ///
    /// 多条走法终点相同时，执行吃子最多的一条（相同则取先生成的）。
    pub fn attempt_place(&mut self, cell_index: usize) -> bool {
        let Some(from) = self.taken else {
            return false;
        };

        let chosen = self
            .moves
            .iter()
            .filter(|m| m.destination().to_index() == cell_index)
            .min_by_key(|m| Reverse(m.captured_indices().len()))
            .cloned();
        let Some(mv) = chosen else {
            return false;
        };

        // 在副本上执行，失败时原棋盘不受影响
        let mut next = self.board.clone();
        for captured in mv.captured_indices() {
            next.remove(captured);
        }
        if let Err(e) = next.relocate(from, mv.destination()) {
            warn!("落子失败 {}: {}", mv, e);
            return false;
        }

        debug!("执行走法 {}", mv);
        self.board = next;
        self.last_move = Some(mv);
        self.clear_selection();
        true
    }

    /// `side` 是否已经获胜：对方没有棋子，或对方所有棋子都无路可走
    pub fn is_win(&self, side: Side) -> bool {
        let opponent = side.opponent();
        self.board.count(opponent) == 0 || !MoveGenerator::side_has_moves(&self.board, opponent)
    }
}

impl Default for BoardController {
    fn default() -> Self {
        Self::new()
    }
}
