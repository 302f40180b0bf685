//! 模块可加载性诊断
//!
//! 以模块自身目录解析依赖的方式加载一次，成功后立即卸载。

use super::{Diagnosis, DiagnosticResult};
use crate::native::library::open_library;
use std::path::Path;

/// 探测模块文件是否存在且可连同依赖一起加载
///
/// 该调用仅用于诊断，返回前模块一定已被卸载。
pub fn probe_module(path: impl AsRef<Path>) -> DiagnosticResult {
    let path = path.as_ref();

    if !path.is_file() {
        tracing::warn!(target: "diagnostics", "Module not found: {}", path.display());
        return DiagnosticResult::failure(
            path,
            Diagnosis::ModuleMissing,
            format!("Module not found: {}", path.display()),
        );
    }

    match open_library(path) {
        Ok(library) => {
            if let Err(e) = library.close() {
                tracing::warn!(target: "diagnostics", "Failed to unload probed module: {}", e);
            }
            tracing::debug!(target: "diagnostics", "Module is loadable: {}", path.display());
            DiagnosticResult::loadable(path)
        }
        Err(failure) => {
            tracing::warn!(
                target: "diagnostics",
                "Module failed to load: {} ({})",
                path.display(),
                failure.message
            );
            DiagnosticResult::failure(
                path,
                Diagnosis::ModuleLoadFailure { code: failure.code },
                failure.message,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ErrorKind, HostError};

    #[test]
    fn test_missing_module() {
        let dir = tempfile::tempdir().unwrap();
        let result = probe_module(dir.path().join("missing.dll"));
        assert!(!result.ok);
        assert_eq!(result.classification, Diagnosis::ModuleMissing);
        assert!(matches!(
            result.into_result(),
            Err(HostError::ModuleMissing { .. })
        ));
    }

    #[test]
    fn test_directory_is_not_a_module() {
        let dir = tempfile::tempdir().unwrap();
        let result = probe_module(dir.path());
        assert_eq!(result.classification, Diagnosis::ModuleMissing);
    }

    #[test]
    fn test_garbage_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.dll");
        std::fs::write(&path, b"definitely not a shared library").unwrap();

        let result = probe_module(&path);
        assert!(!result.ok);
        assert!(matches!(
            result.classification,
            Diagnosis::ModuleLoadFailure { .. }
        ));
        assert!(!result.message.is_empty());
        assert_eq!(
            result.into_result().unwrap_err().kind(),
            ErrorKind::ModuleLoadFailure
        );
    }
}
