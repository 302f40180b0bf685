use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 默认原生模块文件名
#[cfg(windows)]
pub const DEFAULT_MODULE_FILE: &str = "ApplicationDLL.dll";
#[cfg(target_os = "macos")]
pub const DEFAULT_MODULE_FILE: &str = "libApplicationDLL.dylib";
#[cfg(not(any(windows, target_os = "macos")))]
pub const DEFAULT_MODULE_FILE: &str = "libApplicationDLL.so";

/// 原生模块配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// 模块路径，相对路径以可执行文件所在目录为基准
    pub path: PathBuf,
}

impl_default!(ModuleConfig {
    path: PathBuf::from(DEFAULT_MODULE_FILE),
});

impl ModuleConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "Module path is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// 解析后的模块路径
    pub fn resolved_path(&self) -> PathBuf {
        let base = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        self.resolve_against(&base)
    }

    /// 以给定目录为基准解析模块路径
    pub fn resolve_against(&self, base: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base.join(&self.path)
        }
    }
}
