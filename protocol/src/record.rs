//! 对局记录格式
//!
//! 一局中每一手（一次落子）的 JSON 记录，便于回放与排查两端棋盘不一致。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::moves::Move;
use crate::piece::{Position, Side};

/// 记录格式版本
pub const RECORD_VERSION: &str = "1.0";

/// 对局结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEnd {
    /// 一方获胜
    Win(Side),
    /// 对端断开
    Disconnected,
}

/// 对局元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// 本端执子方
    pub local_side: Side,
    /// GameStart 问候语
    pub greeting: Option<String>,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 结束方式
    pub end: Option<MatchEnd>,
}

/// 一手记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlyRecord {
    pub side: Side,
    /// 起始位置 [i, j]
    pub from: [u8; 2],
    /// 目标位置 [i, j]
    pub to: [u8; 2],
    /// 被吃棋子的格子索引
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captured: Vec<usize>,
    pub timestamp: DateTime<Utc>,
}

impl PlyRecord {
    /// 从已执行的走法创建
    pub fn from_move(side: Side, mv: &Move) -> Self {
        let to = mv.destination();
        Self {
            side,
            from: [mv.from.i, mv.from.j],
            to: [to.i, to.j],
            captured: mv.captured_indices(),
            timestamp: Utc::now(),
        }
    }

    pub fn from_position(&self) -> Option<Position> {
        Position::new(self.from[0], self.from[1])
    }

    pub fn to_position(&self) -> Option<Position> {
        Position::new(self.to[0], self.to[1])
    }
}

/// 完整对局记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub version: String,
    pub metadata: MatchMetadata,
    pub plies: Vec<PlyRecord>,
}

impl MatchRecord {
    /// 创建新记录
    pub fn new(local_side: Side) -> Self {
        Self {
            version: RECORD_VERSION.to_string(),
            metadata: MatchMetadata {
                local_side,
                greeting: None,
                started_at: Utc::now(),
                end: None,
            },
            plies: Vec::new(),
        }
    }

    /// 追加一手
    pub fn push(&mut self, side: Side, mv: &Move) {
        self.plies.push(PlyRecord::from_move(side, mv));
    }

    /// 标记结束（只记录第一次）
    pub fn finish(&mut self, end: MatchEnd) {
        if self.metadata.end.is_none() {
            self.metadata.end = Some(end);
        }
    }

    /// 总吃子数
    pub fn capture_count(&self) -> usize {
        self.plies.iter().map(|p| p.captured.len()).sum()
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::moves::MoveGenerator;

    #[test]
    fn test_record_json() {
        let mut board = Board::empty();
        board.place(Side::White, Position::new_unchecked(2, 2)).unwrap();
        board.place(Side::Black, Position::new_unchecked(3, 3)).unwrap();
        let moves = MoveGenerator::legal_moves(&board, Position::new_unchecked(2, 2).to_index());
        let capture = moves.iter().find(|m| m.is_capture()).unwrap();

        let mut record = MatchRecord::new(Side::White);
        record.push(Side::White, capture);
        record.finish(MatchEnd::Win(Side::White));
        record.finish(MatchEnd::Disconnected);

        let json = record.to_json().unwrap();
        let parsed = MatchRecord::from_json(&json).unwrap();

        assert_eq!(parsed.plies, record.plies);
        assert_eq!(parsed.metadata.end, Some(MatchEnd::Win(Side::White)));
        assert_eq!(parsed.capture_count(), 1);
        assert_eq!(parsed.plies[0].from_position(), Some(Position::new_unchecked(2, 2)));
        assert_eq!(parsed.plies[0].to_position(), Some(Position::new_unchecked(4, 4)));
    }

    #[test]
    fn test_advance_omits_captured_field() {
        let board = Board::initial();
        let moves = MoveGenerator::legal_moves(&board, Position::new_unchecked(2, 2).to_index());

        let mut record = MatchRecord::new(Side::White);
        record.push(Side::White, &moves[0]);

        let json = record.to_json().unwrap();
        assert!(!json.contains("captured"));
    }
}
