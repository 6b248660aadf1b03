//! 走法生成
//!
//! 普通兵只能斜向前进一格；吃子四个斜向都可以，并且可以连跳。
//! 连跳搜索是递归的，`blocked` 集合记录本条跳吃链已经出发过的格子，
//! 按值传递给下一层，各分支互不影响。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::piece::{Checker, Position, Side};

/// 四个斜向
const DIAGONALS: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// 走法中的一步
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    /// 落点
    pub to: Position,
    /// 本步吃掉的棋子所在格子索引
    pub captured: Option<usize>,
}

impl Step {
    /// 普通前进一步
    pub fn advance(to: Position) -> Self {
        Self { to, captured: None }
    }

    /// 跳吃一步
    pub fn capture(to: Position, captured: usize) -> Self {
        Self {
            to,
            captured: Some(captured),
        }
    }
}

/// 走法：非空的有序步序列
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 起始位置
    pub from: Position,
    steps: Vec<Step>,
}

impl Move {
    /// 单步走法
    pub fn single(from: Position, step: Step) -> Self {
        Self {
            from,
            steps: vec![step],
        }
    }

    /// 把 `step` 接在后续走法前面，组成更长的跳吃链
    pub fn prefixed(from: Position, step: Step, continuation: Move) -> Self {
        let mut steps = Vec::with_capacity(continuation.steps.len() + 1);
        steps.push(step);
        steps.extend(continuation.steps);
        Self { from, steps }
    }

    /// 所有步
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// 步数
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// 走法总是非空
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 终点（最后一步的落点）
    pub fn destination(&self) -> Position {
        // steps 由构造函数保证非空
        self.steps.last().map(|s| s.to).unwrap_or(self.from)
    }

    /// 被吃棋子的格子索引，按跳吃顺序
    pub fn captured_indices(&self) -> Vec<usize> {
        self.steps.iter().filter_map(|s| s.captured).collect()
    }

    /// 是否为跳吃链
    pub fn is_capture(&self) -> bool {
        self.steps.len() > 1 || self.steps.iter().any(|s| s.captured.is_some())
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.from)?;
        for step in &self.steps {
            let sep = if step.captured.is_some() { " x " } else { " -> " };
            write!(f, "{}{}", sep, step.to)?;
        }
        Ok(())
    }
}

/// 所有走法终点的去重集合（用于合法性判断与高亮）
pub fn allowed_destinations(moves: &[Move]) -> BTreeSet<usize> {
    moves.iter().map(|m| m.destination().to_index()).collect()
}

/// 走法生成器
pub struct MoveGenerator;

impl MoveGenerator {
    /// 为棋子生成走法
    ///
    /// `forced_capture_only` 为 true 时只找跳吃（延伸跳吃链时使用），
    /// `blocked` 中的格子不能作为落点。
    /// 返回所有单步跳吃以及每一条前缀+后续的合并链，不去重。
    pub fn generate(
        board: &Board,
        checker: &Checker,
        forced_capture_only: bool,
        blocked: &BTreeSet<usize>,
    ) -> Vec<Move> {
        Self::search(board, checker.side, checker.position, forced_capture_only, blocked)
    }

    /// 指定格子上棋子的全部走法（空集合、允许普通前进）
    pub fn legal_moves(board: &Board, index: usize) -> Vec<Move> {
        match board.checker_at(index) {
            Some(checker) => Self::generate(board, checker, false, &BTreeSet::new()),
            None => Vec::new(),
        }
    }

    /// 指定阵营是否还有任何走法
    pub fn side_has_moves(board: &Board, side: Side) -> bool {
        let blocked = BTreeSet::new();
        board
            .checkers(side)
            .any(|checker| !Self::generate(board, checker, false, &blocked).is_empty())
    }

    fn search(
        board: &Board,
        side: Side,
        from: Position,
        forced_capture_only: bool,
        blocked: &BTreeSet<usize>,
    ) -> Vec<Move> {
        let mut moves = Vec::new();

        if !forced_capture_only {
            Self::generate_advances(board, side, from, &mut moves);
        }

        for (di, dj) in DIAGONALS {
            let Some(over) = from.offset(di, dj) else {
                continue;
            };
            if board.side_at(over.to_index()) != Some(side.opponent()) {
                continue;
            }
            let Some(landing) = from.offset(2 * di, 2 * dj) else {
                continue;
            };
            let landing_index = landing.to_index();
            if board.is_occupied(landing_index) || blocked.contains(&landing_index) {
                continue;
            }

            let step = Step::capture(landing, over.to_index());
            moves.push(Move::single(from, step));

            // 从落点继续找跳吃，当前出发格加入 blocked
            let mut next_blocked = blocked.clone();
            next_blocked.insert(from.to_index());
            for continuation in Self::search(board, side, landing, true, &next_blocked) {
                moves.push(Move::prefixed(from, step, continuation));
            }
        }

        moves
    }

    /// 向前斜走一格
    fn generate_advances(board: &Board, side: Side, from: Position, moves: &mut Vec<Move>) {
        for di in [-1i8, 1i8] {
            if let Some(to) = from.offset(di, side.forward()) {
                if !board.is_occupied(to.to_index()) {
                    moves.push(Move::single(from, Step::advance(to)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(i: u8, j: u8) -> Position {
        Position::new_unchecked(i, j)
    }

    fn board_with(white: &[(u8, u8)], black: &[(u8, u8)]) -> Board {
        let mut board = Board::empty();
        for &(i, j) in white {
            board.place(Side::White, pos(i, j)).unwrap();
        }
        for &(i, j) in black {
            board.place(Side::Black, pos(i, j)).unwrap();
        }
        board
    }

    #[test]
    fn test_initial_move_count() {
        let board = Board::initial();

        // 每方只有最前一排能动：边上的棋子 1 步，其余 3 个各 2 步
        let count = |side| {
            board
                .checkers(side)
                .map(|c| MoveGenerator::legal_moves(&board, c.index()).len())
                .sum::<usize>()
        };
        assert_eq!(count(Side::White), 7);
        assert_eq!(count(Side::Black), 7);
    }

    #[test]
    fn test_advance_direction_by_side() {
        let board = board_with(&[(2, 2)], &[(5, 5)]);

        let white = MoveGenerator::legal_moves(&board, pos(2, 2).to_index());
        let dests = allowed_destinations(&white);
        assert_eq!(dests, [pos(1, 3).to_index(), pos(3, 3).to_index()].into());

        let black = MoveGenerator::legal_moves(&board, pos(5, 5).to_index());
        let dests = allowed_destinations(&black);
        assert_eq!(dests, [pos(4, 4).to_index(), pos(6, 4).to_index()].into());
    }

    #[test]
    fn test_advance_blocked_and_edge() {
        // (0,2) 只能走 (1,3)，而 (1,3) 被占
        let board = board_with(&[(0, 2)], &[(1, 3), (2, 4)]);
        let moves = MoveGenerator::legal_moves(&board, pos(0, 2).to_index());
        assert!(moves.iter().all(|m| m.is_capture()));
    }

    #[test]
    fn test_capture_backwards() {
        // 白子向后吃（j 减小方向）
        let board = board_with(&[(4, 4)], &[(3, 3)]);
        let moves = MoveGenerator::legal_moves(&board, pos(4, 4).to_index());

        let capture = moves.iter().find(|m| m.is_capture()).unwrap();
        assert_eq!(capture.destination(), pos(2, 2));
        assert_eq!(capture.captured_indices(), vec![pos(3, 3).to_index()]);
    }

    #[test]
    fn test_capture_needs_empty_landing() {
        let board = board_with(&[(2, 2)], &[(3, 3), (4, 4)]);
        let moves = MoveGenerator::legal_moves(&board, pos(2, 2).to_index());
        assert!(!moves.iter().any(|m| m.is_capture()));
    }

    #[test]
    fn test_cannot_capture_own_side() {
        let board = board_with(&[(2, 2), (3, 3)], &[]);
        let moves = MoveGenerator::legal_moves(&board, pos(2, 2).to_index());
        assert!(!moves.iter().any(|m| m.is_capture()));
    }

    #[test]
    fn test_chain_capture() {
        // (2,2) 跳过 (3,3) 到 (4,4)，再跳过 (3,5) 到 (2,6)
        let board = board_with(&[(2, 2)], &[(3, 3), (3, 5)]);
        let moves = MoveGenerator::legal_moves(&board, pos(2, 2).to_index());

        let chain = moves.iter().find(|m| m.len() == 2).unwrap();
        assert_eq!(chain.destination(), pos(2, 6));
        assert_eq!(
            chain.captured_indices(),
            vec![pos(3, 3).to_index(), pos(3, 5).to_index()]
        );

        // 部分链也单独列出：前进 1 + 单跳 1 + 连跳 1
        assert_eq!(moves.len(), 3);
        assert!(moves.iter().any(|m| m.len() == 1 && m.destination() == pos(4, 4)));
    }

    #[test]
    fn test_chain_does_not_return_to_visited_origin() {
        // 从 (2,6) 再跳回 (3,5) 会落到 (4,4)，而 (4,4) 已经出发过
        let board = board_with(&[(2, 2)], &[(3, 3), (3, 5)]);
        let moves = MoveGenerator::legal_moves(&board, pos(2, 2).to_index());
        assert!(moves.iter().all(|m| m.len() <= 2));
    }

    #[test]
    fn test_blocked_landing_is_excluded() {
        let board = board_with(&[(2, 2)], &[(3, 3)]);
        let checker = *board.checker_at(pos(2, 2).to_index()).unwrap();
        let blocked: BTreeSet<usize> = [pos(4, 4).to_index()].into();

        let moves = MoveGenerator::generate(&board, &checker, false, &blocked);
        assert!(!moves.iter().any(|m| m.is_capture()));
    }

    #[test]
    fn test_forced_capture_only_skips_advances() {
        let board = board_with(&[(2, 2)], &[]);
        let checker = *board.checker_at(pos(2, 2).to_index()).unwrap();

        let moves = MoveGenerator::generate(&board, &checker, true, &BTreeSet::new());
        assert!(moves.is_empty());
    }

    #[test]
    fn test_side_has_moves() {
        let board = board_with(&[(0, 0), (1, 1), (2, 2)], &[(0, 2)]);
        assert!(MoveGenerator::side_has_moves(&board, Side::White));

        // 黑子 (0,2) 前进被堵，但可以跳过 (1,1) 落到 (2,0)
        let moves = MoveGenerator::legal_moves(&board, pos(0, 2).to_index());
        assert_eq!(allowed_destinations(&moves), [pos(2, 0).to_index()].into());

        let jammed = board_with(&[(1, 1), (2, 0)], &[(0, 2)]);
        assert!(!MoveGenerator::side_has_moves(&jammed, Side::Black));
    }

    #[test]
    fn test_move_display() {
        let board = board_with(&[(2, 2)], &[(3, 3), (3, 5)]);
        let moves = MoveGenerator::legal_moves(&board, pos(2, 2).to_index());
        let chain = moves.iter().find(|m| m.len() == 2).unwrap();
        assert_eq!(chain.to_string(), "(2, 2) x (4, 4) x (2, 6)");
    }
}
