//! 核心模块
//!
//! 包含宿主的核心功能：
//! - `host` - 独立宿主入口和事件循环
//! - `error` - 错误类型定义
//! - `status` - 操作状态面板
//! - `utils` - 工具函数

pub mod error;
pub mod host;
pub mod status;
pub mod utils;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{ErrorKind, HostError, HostResult, PlatformError, PlatformResult};

// 重新导出主要类型
pub use host::Host;
pub use status::{Operation, OperationOutcome, StatusBoard};
