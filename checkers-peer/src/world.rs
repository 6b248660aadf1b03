//! 环境跟踪协作方
//!
//! 真正的空间跟踪、平面检测与渲染都在外部；会话只通过 [`World`] 发出请求，
//! 结果以带 generation 的 `WorldReport` 事件异步送回。

use std::time::Duration;

use protocol::{Vec3, WorldSnapshot};
use rand::RngCore;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::network::DriverEvent;
use crate::session::SessionEvent;

/// 环境建图质量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingQuality {
    NotAvailable,
    Limited,
    Extending,
    Mapped,
}

impl MappingQuality {
    /// 是否足以分享给对端 / 用于重定位
    pub fn is_adequate(&self) -> bool {
        matches!(self, MappingQuality::Extending | MappingQuality::Mapped)
    }
}

/// 环境跟踪与展示
pub trait World {
    /// 在世界坐标处放置棋盘
    fn place_board(&mut self, position: Vec3);

    /// 开始跟踪，加入方会带上主机的快照
    fn start_tracking(&mut self, snapshot: Option<&WorldSnapshot>);

    /// 开始采集快照，之后的报告都带上这个 generation
    fn begin_capture(&mut self, generation: u64);

    /// 展示提示信息
    fn show_notice(&mut self, notice: &str);
}

/// 快照字节数
const SNAPSHOT_SIZE: usize = 4096;

/// 报告序列：质量逐步提高
const QUALITY_RAMP: [MappingQuality; 4] = [
    MappingQuality::NotAvailable,
    MappingQuality::Limited,
    MappingQuality::Extending,
    MappingQuality::Mapped,
];

/// 无头模拟环境：按固定间隔报告逐步变好的建图质量
pub struct SimulatedWorld {
    events: mpsc::UnboundedSender<DriverEvent>,
    interval: Duration,
}

impl SimulatedWorld {
    pub fn new(events: mpsc::UnboundedSender<DriverEvent>, interval: Duration) -> Self {
        Self { events, interval }
    }
}

impl World for SimulatedWorld {
    fn place_board(&mut self, position: Vec3) {
        info!("棋盘放置于 {}", position);
    }

    fn start_tracking(&mut self, snapshot: Option<&WorldSnapshot>) {
        match snapshot {
            Some(s) => info!("使用 {} 字节的快照开始跟踪", s.len()),
            None => info!("开始跟踪"),
        }
    }

    fn begin_capture(&mut self, generation: u64) {
        let mut bytes = vec![0u8; SNAPSHOT_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        let snapshot = WorldSnapshot(bytes);

        let events = self.events.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            for quality in QUALITY_RAMP {
                tokio::time::sleep(interval).await;
                debug!("环境报告 generation={} {:?}", generation, quality);
                let report = SessionEvent::WorldReport {
                    generation,
                    quality,
                    snapshot: quality.is_adequate().then(|| snapshot.clone()),
                };
                if events.send(DriverEvent::Session(report)).is_err() {
                    break;
                }
            }
        });
    }

    fn show_notice(&mut self, notice: &str) {
        println!(">> {}", notice);
    }
}
