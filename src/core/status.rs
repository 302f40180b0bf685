//! 操作状态面板
//!
//! 每个用户级操作产生一条结果记录，替代模态提示框。
//! 记录数量有上限，超出容量时移除最老的记录。

use super::error::{ErrorKind, HostResult};
use crate::impl_default;
use std::collections::VecDeque;
use std::fmt;

/// 用户级操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Show,
    Hide,
    Embed,
    Resize,
    Destroy,
    PlayRequest,
    PlayStart,
    PlayStop,
    Tick,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Show => "show",
            Operation::Hide => "hide",
            Operation::Embed => "embed",
            Operation::Resize => "resize",
            Operation::Destroy => "destroy",
            Operation::PlayRequest => "play-request",
            Operation::PlayStart => "play-start",
            Operation::PlayStop => "play-stop",
            Operation::Tick => "tick",
        };
        f.write_str(name)
    }
}

/// 单次操作结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    /// 操作类型
    pub operation: Operation,
    /// 是否成功
    pub ok: bool,
    /// 失败分类
    pub kind: Option<ErrorKind>,
    /// 可读消息
    pub message: String,
    /// 时间戳（毫秒）
    pub timestamp_ms: u64,
}

/// 状态面板
pub struct StatusBoard {
    entries: VecDeque<OperationOutcome>,
    capacity: usize,
}

impl_default!(StatusBoard {
    entries: VecDeque::new(),
    capacity: 64,
});

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// 记录一条成功结果
    pub fn success(&mut self, operation: Operation, message: impl Into<String>) {
        self.push(OperationOutcome {
            operation,
            ok: true,
            kind: None,
            message: message.into(),
            timestamp_ms: crate::core::utils::current_timestamp_ms(),
        });
    }

    /// 根据操作结果记录
    pub fn record<T>(
        &mut self,
        operation: Operation,
        result: &HostResult<T>,
        success_message: impl FnOnce(&T) -> String,
    ) {
        match result {
            Ok(value) => self.success(operation, success_message(value)),
            Err(err) => {
                tracing::warn!(target: "status", "{} failed: {}", operation, err);
                self.push(OperationOutcome {
                    operation,
                    ok: false,
                    kind: Some(err.kind()),
                    message: err.to_string(),
                    timestamp_ms: crate::core::utils::current_timestamp_ms(),
                });
            }
        }
    }

    fn push(&mut self, outcome: OperationOutcome) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(outcome);
    }

    /// 最近一次结果
    pub fn latest(&self) -> Option<&OperationOutcome> {
        self.entries.back()
    }

    /// 指定操作的最近一次结果
    pub fn latest_for(&self, operation: Operation) -> Option<&OperationOutcome> {
        self.entries.iter().rev().find(|o| o.operation == operation)
    }

    pub fn entries(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.entries.iter()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.entries.iter().filter(|o| !o.ok)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HostError;

    #[test]
    fn test_record_success_and_failure() {
        let mut board = StatusBoard::new();
        let ok: HostResult<u32> = Ok(7);
        board.record(Operation::Create, &ok, |v| format!("handle {}", v));

        let err: HostResult<()> = Err(HostError::NoWindow);
        board.record(Operation::Show, &err, |_| String::new());

        assert_eq!(board.len(), 2);
        let latest = board.latest().unwrap();
        assert_eq!(latest.operation, Operation::Show);
        assert!(!latest.ok);
        assert_eq!(latest.kind, Some(ErrorKind::InvalidState));
        assert_eq!(board.latest_for(Operation::Create).unwrap().message, "handle 7");
        assert_eq!(board.failures().count(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut board = StatusBoard::with_capacity(2);
        board.success(Operation::Create, "a");
        board.success(Operation::Show, "b");
        board.success(Operation::Hide, "c");

        let ops: Vec<_> = board.entries().map(|o| o.operation).collect();
        assert_eq!(ops, vec![Operation::Show, Operation::Hide]);
    }
}
