//! 播放会话
//!
//! - `controller` - 由原生运行标志的边沿驱动的播放状态机
//! - `pump` - 固定间隔的节拍泵
//!
//! 模拟实现通过 [`PlayGame`] 接入，只需提供开始、节拍、停止三个钩子。

pub mod controller;
pub mod pump;

pub use controller::{PlaySessionController, PlayState, PlayTransition};
pub use pump::{TickPump, TickTarget};

/// 可插拔的模拟实现
pub trait PlayGame {
    /// 每次 Stopped→Running 边沿调用一次
    fn start(&mut self);

    /// 运行期间每个节拍调用
    fn tick(&mut self, delta_seconds: f32);

    /// 每次 Running→Stopped 边沿调用一次
    fn stop(&mut self);
}

/// 观测事件的节拍间隔
pub const REPORT_EVERY_TICKS: u64 = 60;

/// 参考模拟实现
///
/// 累计运行时间，每 60 个节拍输出一次观测事件。
#[derive(Debug, Default)]
pub struct SampleGame {
    elapsed: f32,
    frame_count: u64,
    reports: u64,
}

impl SampleGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// 本次会话累计的秒数
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// 已输出的观测事件数
    pub fn reports(&self) -> u64 {
        self.reports
    }
}

impl PlayGame for SampleGame {
    fn start(&mut self) {
        self.elapsed = 0.0;
        self.frame_count = 0;
        tracing::info!(target: "play", "Game start");
    }

    fn tick(&mut self, delta_seconds: f32) {
        self.elapsed += delta_seconds;
        self.frame_count += 1;

        if self.frame_count % REPORT_EVERY_TICKS == 0 {
            self.reports += 1;
            tracing::info!(target: "play", elapsed = self.elapsed, "Tick elapsed={:.2}s", self.elapsed);
        }
    }

    fn stop(&mut self) {
        tracing::info!(target: "play", "Game stop total={:.2}s", self.elapsed);
    }
}
