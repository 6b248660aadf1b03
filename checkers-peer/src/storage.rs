//! 对局记录存储
//!
//! 记录以 JSON 文件保存在 `<data_dir>/checkers/records`。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use protocol::{MatchEnd, MatchRecord, Side};

/// 存储管理器
pub struct StorageManager {
    records_dir: PathBuf,
}

impl StorageManager {
    /// 使用默认数据目录
    pub fn new() -> Result<Self> {
        Self::with_dir(get_records_directory()?)
    }

    /// 使用指定目录
    pub fn with_dir(records_dir: impl Into<PathBuf>) -> Result<Self> {
        let records_dir = records_dir.into();
        if !records_dir.exists() {
            fs::create_dir_all(&records_dir)
                .with_context(|| format!("无法创建记录目录: {:?}", records_dir))?;
        }
        Ok(Self { records_dir })
    }

    /// 保存记录，返回记录 ID（文件名）
    pub fn save_record(&self, record: &MatchRecord) -> Result<String> {
        let base = generate_filename(
            &record.metadata.started_at,
            record.metadata.local_side,
            record.metadata.end,
        );

        // 同一秒内的多局记录追加序号
        let mut filename = format!("{}.json", base);
        let mut n = 1;
        while self.records_dir.join(&filename).exists() {
            n += 1;
            filename = format!("{}_{}.json", base, n);
        }

        let filepath = self.records_dir.join(&filename);
        let content = record.to_json().context("序列化对局记录失败")?;
        fs::write(&filepath, content)
            .with_context(|| format!("写入文件失败: {:?}", filepath))?;

        tracing::info!("对局记录已保存: {:?}", filepath);
        Ok(filename)
    }

    /// 加载记录
    pub fn load_record(&self, record_id: &str) -> Result<MatchRecord> {
        let filepath = self.records_dir.join(sanitize_filename(record_id));
        if !filepath.exists() {
            anyhow::bail!("记录文件不存在: {}", record_id);
        }

        let content = fs::read_to_string(&filepath)
            .with_context(|| format!("读取文件失败: {:?}", filepath))?;
        MatchRecord::from_json(&content).context("解析记录文件失败")
    }

    /// 列出所有记录，最新的在前
    pub fn list_records(&self) -> Result<Vec<RecordInfo>> {
        let mut records = Vec::new();

        let entries = fs::read_dir(&self.records_dir)
            .with_context(|| format!("读取记录目录失败: {:?}", self.records_dir))?;

        for entry in entries {
            let path = entry.context("读取目录项失败")?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.load_record(filename) {
                Ok(record) => records.push(RecordInfo {
                    record_id: filename.to_string(),
                    local_side: record.metadata.local_side,
                    started_at: record.metadata.started_at,
                    end: record.metadata.end,
                    ply_count: record.plies.len(),
                }),
                Err(e) => tracing::debug!("跳过损坏的记录 {}: {}", filename, e),
            }
        }

        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records)
    }

    /// 删除记录
    pub fn delete_record(&self, record_id: &str) -> Result<()> {
        let filepath = self.records_dir.join(sanitize_filename(record_id));
        if filepath.exists() {
            fs::remove_file(&filepath)
                .with_context(|| format!("删除文件失败: {:?}", filepath))?;
        }
        Ok(())
    }

    pub fn records_directory(&self) -> &Path {
        &self.records_dir
    }
}

/// 记录概要
#[derive(Debug, Clone)]
pub struct RecordInfo {
    /// 记录 ID（文件名）
    pub record_id: String,
    pub local_side: Side,
    pub started_at: DateTime<Utc>,
    pub end: Option<MatchEnd>,
    pub ply_count: usize,
}

fn get_records_directory() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("无法获取应用数据目录")?;
    Ok(data_dir.join("checkers").join("records"))
}

fn end_label(end: Option<MatchEnd>) -> &'static str {
    match end {
        Some(MatchEnd::Win(Side::White)) => "white-won",
        Some(MatchEnd::Win(Side::Black)) => "black-won",
        Some(MatchEnd::Disconnected) => "disconnected",
        None => "unfinished",
    }
}

/// 生成文件名（不含扩展名）
fn generate_filename(timestamp: &DateTime<Utc>, local_side: Side, end: Option<MatchEnd>) -> String {
    format!(
        "{}_{}_{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        local_side.display_name().to_lowercase(),
        end_label(end)
    )
}

/// 去掉路径分隔符等特殊字符，记录 ID 只能指向记录目录内的文件
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{MoveGenerator, Board, Position};
    use tempfile::TempDir;

    fn create_test_storage() -> (StorageManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::with_dir(temp_dir.path()).unwrap();
        (storage, temp_dir)
    }

    fn sample_record() -> MatchRecord {
        let board = Board::initial();
        let mut record = MatchRecord::new(Side::White);
        let moves = MoveGenerator::legal_moves(&board, Position::new_unchecked(2, 2).to_index());
        record.push(Side::White, &moves[0]);
        record
    }

    #[test]
    fn test_save_and_load_record() {
        let (storage, _temp_dir) = create_test_storage();

        let mut record = sample_record();
        record.finish(MatchEnd::Disconnected);
        let record_id = storage.save_record(&record).unwrap();
        assert!(record_id.ends_with("_white_disconnected.json"));

        let loaded = storage.load_record(&record_id).unwrap();
        assert_eq!(loaded.plies, record.plies);
        assert_eq!(loaded.metadata.end, Some(MatchEnd::Disconnected));
    }

    #[test]
    fn test_list_records() {
        let (storage, temp_dir) = create_test_storage();

        for _ in 0..3 {
            storage.save_record(&sample_record()).unwrap();
        }
        fs::write(temp_dir.path().join("broken.json"), "{").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();

        let records = storage.list_records().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.ply_count == 1));
        for pair in records.windows(2) {
            assert!(pair[0].started_at >= pair[1].started_at);
        }
    }

    #[test]
    fn test_delete_record() {
        let (storage, _temp_dir) = create_test_storage();
        let record_id = storage.save_record(&sample_record()).unwrap();

        storage.delete_record(&record_id).unwrap();
        assert!(storage.list_records().unwrap().is_empty());
        assert!(storage.load_record(&record_id).is_err());
    }

    #[test]
    fn test_generate_filename() {
        let timestamp = DateTime::parse_from_rfc3339("2026-01-09T15:30:22Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(
            generate_filename(&timestamp, Side::Black, Some(MatchEnd::Win(Side::Black))),
            "20260109_153022_black_black-won"
        );
        assert_eq!(
            generate_filename(&timestamp, Side::White, None),
            "20260109_153022_white_unfinished"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("record.json"), "record.json");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    }
}
