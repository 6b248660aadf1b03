//! 棋子、格子与位置定义

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SIZE, CELL_COUNT};

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 白方（先手，主机方，从 j=0 一侧出发）
    White,
    /// 黑方（后手，加入方，从 j=7 一侧出发）
    Black,
}

impl Side {
    /// 获取对方阵营
    pub fn opponent(&self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// 前进方向（j 轴增量）
    pub fn forward(&self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    /// 显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 棋盘位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 列 (0-7)
    pub i: u8,
    /// 行 (0-7)
    pub j: u8,
}

impl Position {
    /// 创建新位置
    pub fn new(i: u8, j: u8) -> Option<Self> {
        if (i as usize) < BOARD_SIZE && (j as usize) < BOARD_SIZE {
            Some(Self { i, j })
        } else {
            None
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub const fn new_unchecked(i: u8, j: u8) -> Self {
        Self { i, j }
    }

    /// 从网络消息中的有符号坐标创建
    pub fn from_coords(i: i32, j: i32) -> Option<Self> {
        let i = u8::try_from(i).ok()?;
        let j = u8::try_from(j).ok()?;
        Self::new(i, j)
    }

    /// 检查位置是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (self.i as usize) < BOARD_SIZE && (self.j as usize) < BOARD_SIZE
    }

    /// 是否为黑格（只有黑格能放棋子）
    pub fn is_black(&self) -> bool {
        (self.i + self.j) % 2 == 0
    }

    /// 获取偏移后的位置
    pub fn offset(&self, di: i8, dj: i8) -> Option<Position> {
        let new_i = self.i as i8 + di;
        let new_j = self.j as i8 + dj;
        if new_i >= 0 && (new_i as usize) < BOARD_SIZE && new_j >= 0 && (new_j as usize) < BOARD_SIZE {
            Some(Position {
                i: new_i as u8,
                j: new_j as u8,
            })
        } else {
            None
        }
    }

    /// 转换为格子索引 k = j * 8 + i
    pub fn to_index(&self) -> usize {
        self.j as usize * BOARD_SIZE + self.i as usize
    }

    /// 从格子索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Position {
                i: (index % BOARD_SIZE) as u8,
                j: (index / BOARD_SIZE) as u8,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// 棋盘格子，构造后不再变化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub position: Position,
    pub is_black: bool,
}

impl Cell {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            is_black: position.is_black(),
        }
    }

    pub fn index(&self) -> usize {
        self.position.to_index()
    }
}

/// 棋子（本变体没有升王规则）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checker {
    pub side: Side,
    pub position: Position,
}

impl Checker {
    /// 创建新棋子
    pub fn new(side: Side, position: Position) -> Self {
        Self { side, position }
    }

    /// 当前所在格子索引
    pub fn index(&self) -> usize {
        self.position.to_index()
    }

    /// 棋盘文本中的字符
    pub fn display_char(&self) -> char {
        match self.side {
            Side::White => 'w',
            Side::Black => 'b',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_valid() {
        assert!(Position::new(0, 0).is_some());
        assert!(Position::new(7, 7).is_some());
        assert!(Position::new(8, 0).is_none());
        assert!(Position::new(0, 8).is_none());
        assert!(Position::from_coords(-1, 3).is_none());
        assert_eq!(Position::from_coords(2, 3), Some(Position::new_unchecked(2, 3)));
    }

    #[test]
    fn test_index_mapping() {
        let pos = Position::new_unchecked(3, 5);
        assert_eq!(pos.to_index(), 43);
        assert_eq!(Position::from_index(43), Some(pos));
        assert_eq!(Position::from_index(64), None);
    }

    #[test]
    fn test_black_parity() {
        assert!(Position::new_unchecked(0, 0).is_black());
        assert!(Position::new_unchecked(1, 1).is_black());
        assert!(!Position::new_unchecked(1, 0).is_black());
        assert!(!Position::new_unchecked(0, 7).is_black());
    }

    #[test]
    fn test_offset_bounds() {
        let corner = Position::new_unchecked(0, 0);
        assert_eq!(corner.offset(-1, 1), None);
        assert_eq!(corner.offset(1, 1), Some(Position::new_unchecked(1, 1)));
        assert_eq!(Position::new_unchecked(7, 7).offset(1, 1), None);
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::White.opponent(), Side::Black);
        assert_eq!(Side::Black.opponent(), Side::White);
        assert_eq!(Side::White.forward(), 1);
        assert_eq!(Side::Black.forward(), -1);
    }
}
