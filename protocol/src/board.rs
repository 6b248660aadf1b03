//! 棋盘状态

use std::collections::BTreeMap;

use crate::constants::{BLACK_HOME_FROM, BOARD_SIZE, CELL_COUNT, WHITE_HOME_ROWS};
use crate::error::RuleError;
use crate::piece::{Cell, Checker, Position, Side};

/// 棋盘
///
/// 64 个格子构造后不变；两方棋子各自按格子索引存放，
/// 同一索引在两张表中至多出现一次，且只落在黑格上。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Cell>,
    white: BTreeMap<usize, Checker>,
    black: BTreeMap<usize, Checker>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        let cells = (0..CELL_COUNT)
            .filter_map(Position::from_index)
            .map(Cell::new)
            .collect();
        Self {
            cells,
            white: BTreeMap::new(),
            black: BTreeMap::new(),
        }
    }

    /// 创建初始棋盘：白方占 j<3 的黑格，黑方占 j>4 的黑格
    pub fn initial() -> Self {
        let mut board = Self::empty();
        for j in 0..BOARD_SIZE as u8 {
            for i in 0..BOARD_SIZE as u8 {
                let pos = Position::new_unchecked(i, j);
                if !pos.is_black() {
                    continue;
                }
                if j < WHITE_HOME_ROWS {
                    board.insert(Checker::new(Side::White, pos));
                } else if j >= BLACK_HOME_FROM {
                    board.insert(Checker::new(Side::Black, pos));
                }
            }
        }
        board
    }

    fn insert(&mut self, checker: Checker) {
        self.side_map_mut(checker.side).insert(checker.index(), checker);
    }

    fn side_map(&self, side: Side) -> &BTreeMap<usize, Checker> {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<usize, Checker> {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    /// 放置棋子（只能放在空的黑格上）
    pub fn place(&mut self, side: Side, pos: Position) -> Result<(), RuleError> {
        if !pos.is_valid() {
            return Err(RuleError::InvalidPosition {
                i: pos.i as i8,
                j: pos.j as i8,
            });
        }
        if !pos.is_black() {
            return Err(RuleError::NotBlackCell { i: pos.i, j: pos.j });
        }
        if self.is_occupied(pos.to_index()) {
            return Err(RuleError::Occupied { i: pos.i, j: pos.j });
        }
        self.insert(Checker::new(side, pos));
        Ok(())
    }

    /// 所有格子
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// 获取指定索引上的棋子
    pub fn checker_at(&self, index: usize) -> Option<&Checker> {
        self.white.get(&index).or_else(|| self.black.get(&index))
    }

    /// 获取指定索引上棋子的阵营
    pub fn side_at(&self, index: usize) -> Option<Side> {
        self.checker_at(index).map(|c| c.side)
    }

    /// 格子是否被占据
    pub fn is_occupied(&self, index: usize) -> bool {
        self.white.contains_key(&index) || self.black.contains_key(&index)
    }

    /// 获取指定阵营的所有棋子
    pub fn checkers(&self, side: Side) -> impl Iterator<Item = &Checker> {
        self.side_map(side).values()
    }

    /// 指定阵营剩余棋子数
    pub fn count(&self, side: Side) -> usize {
        self.side_map(side).len()
    }

    /// 双方棋子总数
    pub fn total(&self) -> usize {
        self.white.len() + self.black.len()
    }

    /// 移除棋子（被吃后永久移除）
    pub fn remove(&mut self, index: usize) -> Option<Checker> {
        self.white
            .remove(&index)
            .or_else(|| self.black.remove(&index))
    }

    /// 移动棋子（不检查规则）
    pub fn relocate(&mut self, from: usize, to: Position) -> Result<(), RuleError> {
        let pos = Position::from_index(from).ok_or(RuleError::InvalidIndex(from))?;
        let checker = self
            .remove(from)
            .ok_or(RuleError::NoChecker { i: pos.i, j: pos.j })?;
        if let Err(e) = self.place(checker.side, to) {
            // 放回原处，保持棋盘不变
            self.insert(checker);
            return Err(e);
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Board {
    /// 以 j=7 在上的方式输出 8x8 文本棋盘
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for j in (0..BOARD_SIZE as u8).rev() {
            write!(f, "{} ", j)?;
            for i in 0..BOARD_SIZE as u8 {
                let pos = Position::new_unchecked(i, j);
                let c = match self.checker_at(pos.to_index()) {
                    Some(checker) => checker.display_char(),
                    None if pos.is_black() => '.',
                    None => ' ',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "  01234567")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_board() {
        let board = Board::initial();

        assert_eq!(board.count(Side::White), 12);
        assert_eq!(board.count(Side::Black), 12);
        assert_eq!(board.cells().len(), 64);

        // 中间两行为空
        for j in 3..5 {
            for i in 0..8 {
                assert!(!board.is_occupied(Position::new_unchecked(i, j).to_index()));
            }
        }

        assert_eq!(board.side_at(Position::new_unchecked(0, 0).to_index()), Some(Side::White));
        assert_eq!(board.side_at(Position::new_unchecked(1, 7).to_index()), Some(Side::Black));
    }

    #[test]
    fn test_checkers_on_black_cells() {
        let board = Board::initial();
        for side in [Side::White, Side::Black] {
            assert!(board.checkers(side).all(|c| c.position.is_black()));
        }
    }

    #[test]
    fn test_place_rules() {
        let mut board = Board::empty();
        let pos = Position::new_unchecked(2, 2);

        assert!(board.place(Side::White, pos).is_ok());
        assert_eq!(
            board.place(Side::Black, pos),
            Err(RuleError::Occupied { i: 2, j: 2 })
        );
        assert_eq!(
            board.place(Side::Black, Position::new_unchecked(1, 2)),
            Err(RuleError::NotBlackCell { i: 1, j: 2 })
        );
    }

    #[test]
    fn test_relocate_and_remove() {
        let mut board = Board::empty();
        let from = Position::new_unchecked(2, 2);
        let to = Position::new_unchecked(3, 3);
        board.place(Side::White, from).unwrap();

        board.relocate(from.to_index(), to).unwrap();
        assert!(!board.is_occupied(from.to_index()));
        assert_eq!(board.checker_at(to.to_index()).map(|c| c.position), Some(to));

        let removed = board.remove(to.to_index());
        assert_eq!(removed.map(|c| c.side), Some(Side::White));
        assert_eq!(board.total(), 0);
    }

    #[test]
    fn test_relocate_onto_occupied_keeps_board() {
        let mut board = Board::empty();
        let a = Position::new_unchecked(2, 2);
        let b = Position::new_unchecked(3, 3);
        board.place(Side::White, a).unwrap();
        board.place(Side::Black, b).unwrap();

        let before = board.clone();
        assert!(board.relocate(a.to_index(), b).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_relocate_missing_source() {
        let mut board = Board::initial();
        let to = Position::new_unchecked(3, 3);

        assert_eq!(board.relocate(64, to), Err(RuleError::InvalidIndex(64)));
        assert_eq!(
            board.relocate(Position::new_unchecked(2, 4).to_index(), to),
            Err(RuleError::NoChecker { i: 2, j: 4 })
        );
        assert_eq!(board, Board::initial());
    }
}
