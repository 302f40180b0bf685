//! 模块诊断
//!
//! 在调用原生工厂之前执行的检查：模块文件是否存在、能否连同依赖加载、
//! 位宽是否与当前进程一致。位宽不一致时直接调用原生函数会导致进程崩溃，
//! 因此这些检查必须先于任何原生调用。

pub mod pe;
pub mod probe;

pub use pe::{detect_bitness, read_bitness, Bitness};
pub use probe::probe_module;

use crate::core::error::{HostError, HostResult};
use std::path::{Path, PathBuf};

/// 诊断分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    Loadable,
    ModuleMissing,
    ModuleLoadFailure { code: Option<i32> },
}

/// 单次诊断结果，不持久化
#[derive(Debug, Clone)]
pub struct DiagnosticResult {
    pub ok: bool,
    pub classification: Diagnosis,
    pub message: String,
    pub path: PathBuf,
}

impl DiagnosticResult {
    pub fn loadable(path: &Path) -> Self {
        Self {
            ok: true,
            classification: Diagnosis::Loadable,
            message: format!("Module loaded successfully: {}", path.display()),
            path: path.to_path_buf(),
        }
    }

    pub fn failure(path: &Path, classification: Diagnosis, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            classification,
            message: message.into(),
            path: path.to_path_buf(),
        }
    }

    /// 转换为宿主结果
    pub fn into_result(self) -> HostResult<()> {
        match self.classification {
            Diagnosis::Loadable => Ok(()),
            Diagnosis::ModuleMissing => Err(HostError::ModuleMissing { path: self.path }),
            Diagnosis::ModuleLoadFailure { code } => Err(HostError::ModuleLoadFailure {
                path: self.path,
                code,
                message: self.message,
            }),
        }
    }
}

/// 检查模块位宽是否与当前进程一致
pub fn check_architecture(path: &Path) -> HostResult<Bitness> {
    let module = detect_bitness(path).map_err(|e| HostError::ModuleLoadFailure {
        path: path.to_path_buf(),
        code: e.raw_os_error(),
        message: format!("Unreadable module header: {}", e),
    })?;
    let process = Bitness::current();
    if module != process {
        tracing::warn!(
            target: "diagnostics",
            "Architecture mismatch: process is {}, module is {}",
            process,
            module
        );
        return Err(HostError::ArchitectureMismatch { process, module });
    }
    Ok(module)
}
