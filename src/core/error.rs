//! 统一错误处理模块
//!
//! 提供宿主范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **宿主错误** (`HostError`): 模块诊断、原生窗口生命周期、嵌入与播放会话的错误
//! - **平台错误** (`PlatformError`): 窗口系统调用失败
//!
//! 所有跨越原生边界的失败都以返回值的形式上报，不会以 panic 的形式穿越 FFI 边界。

use crate::config::ConfigError;
use crate::diagnostics::Bitness;
use crate::embedding::preflight::RejectReason;
use std::path::PathBuf;
use thiserror::Error;

/// 宿主核心错误类型
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Native module not found: {}", path.display())]
    ModuleMissing { path: PathBuf },

    #[error("Failed to load native module {}: {message}{}", path.display(), format_code(*code))]
    ModuleLoadFailure {
        path: PathBuf,
        code: Option<i32>,
        message: String,
    },

    #[error("Architecture mismatch: process is {process}, module is {module}")]
    ArchitectureMismatch { process: Bitness, module: Bitness },

    #[error("Native window factory returned a null handle{}", format_code(*last_error))]
    NativeFactoryFailure { last_error: Option<i32> },

    #[error("Embedding rejected: {0}")]
    EmbeddingRejected(RejectReason),

    #[error("Unexpected native fault in {operation}: {detail}")]
    UnexpectedNativeFault {
        operation: &'static str,
        detail: String,
    },

    #[error("Entry point not found: {0}")]
    EntryPointMissing(String),

    #[error("A tick callback is already registered")]
    CallbackAlreadyRegistered,

    #[error("No native window exists")]
    NoWindow,

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),
}

fn format_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" (code=0x{:08X})", code as u32),
        None => String::new(),
    }
}

/// 错误分类
///
/// 状态面板与诊断结果使用的稳定分类，不携带细节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ModuleMissing,
    ModuleLoadFailure,
    ArchitectureMismatch,
    NativeFactoryFailure,
    EmbeddingRejected,
    UnexpectedNativeFault,
    EntryPointMissing,
    InvalidState,
    Platform,
    Environment,
}

impl HostError {
    /// 获取错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::ModuleMissing { .. } => ErrorKind::ModuleMissing,
            HostError::ModuleLoadFailure { .. } => ErrorKind::ModuleLoadFailure,
            HostError::ArchitectureMismatch { .. } => ErrorKind::ArchitectureMismatch,
            HostError::NativeFactoryFailure { .. } => ErrorKind::NativeFactoryFailure,
            HostError::EmbeddingRejected(_) => ErrorKind::EmbeddingRejected,
            HostError::UnexpectedNativeFault { .. } => ErrorKind::UnexpectedNativeFault,
            HostError::EntryPointMissing(_) => ErrorKind::EntryPointMissing,
            HostError::CallbackAlreadyRegistered | HostError::NoWindow => ErrorKind::InvalidState,
            HostError::Platform(_) => ErrorKind::Platform,
            HostError::Config(_) | HostError::Window(_) | HostError::EventLoop(_) => {
                ErrorKind::Environment
            }
        }
    }

    /// 是否为嵌入被拒绝的错误
    pub fn is_rejection(&self) -> bool {
        matches!(self, HostError::EmbeddingRejected(_))
    }
}

/// 平台层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("{call} failed (code={code})")]
    CallFailed { call: &'static str, code: u32 },
}

/// 宿主结果类型别名
pub type HostResult<T> = Result<T, HostError>;
pub type PlatformResult<T> = Result<T, PlatformError>;
