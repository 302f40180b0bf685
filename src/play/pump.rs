//! 节拍泵
//!
//! 在宿主线程上以固定间隔驱动一次完整的节拍。没有队列也没有积压：
//! 错过的节拍合并为一次，下一次截止时间从当前时刻重新计算。

use crate::core::error::HostResult;
use std::time::{Duration, Instant};

/// 每个节拍执行的单元
pub trait TickTarget {
    fn on_tick(&mut self) -> HostResult<()>;
}

/// 固定间隔节拍泵
#[derive(Debug, Clone)]
pub struct TickPump {
    interval: Duration,
    next_due: Option<Instant>,
    ticks: u64,
    coalesced: u64,
}

impl TickPump {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            ticks: 0,
            coalesced: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_started(&self) -> bool {
        self.next_due.is_some()
    }

    /// 启动，第一个节拍在一个间隔之后到期
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
        tracing::debug!(target: "pump", "Tick pump started, interval={:?}", self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// 下一次截止时间，未启动时为 `None`
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due
    }

    /// 是否有节拍到期；到期时消费它并安排下一次
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let late = now.duration_since(due);
        let missed = (late.as_nanos() / self.interval.as_nanos().max(1)) as u64;
        if missed > 0 {
            self.coalesced += missed;
            tracing::trace!(target: "pump", "Coalesced {} missed ticks", missed);
        }

        self.ticks += 1;
        self.next_due = Some(now + self.interval);
        true
    }

    /// 到期时执行一次节拍，返回是否执行
    pub fn run_due(&mut self, now: Instant, target: &mut impl TickTarget) -> HostResult<bool> {
        if !self.poll(now) {
            return Ok(false);
        }
        target.on_tick()?;
        Ok(true)
    }

    /// 已执行的节拍数
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// 被合并掉的节拍数
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
