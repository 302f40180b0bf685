//! 统一配置系统
//!
//! 提供TOML/JSON配置文件、环境变量覆盖和配置验证

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod module;
pub mod session;

pub use module::ModuleConfig;
pub use session::{EmbeddingConfig, TickConfig, WindowConfig};

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 宿主主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// 原生模块配置
    #[serde(default)]
    pub module: ModuleConfig,

    /// 节拍泵配置
    #[serde(default)]
    pub tick: TickConfig,

    /// 宿主窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 嵌入配置
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HostConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 使用给定的变量查找函数覆盖配置
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("PIE_HOST_MODULE") {
            self.module.path = val.into();
        }
        if let Some(val) = lookup("PIE_HOST_TICK_MS") {
            if let Ok(ms) = val.parse() {
                self.tick.interval_ms = ms;
            }
        }
        if let Some(val) = lookup("PIE_HOST_LOG") {
            if let Ok(level) = val.parse() {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.module.validate()?;
        self.tick.validate()?;
        self.window.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./pie_host.toml
    /// 2. ./pie_host.json
    /// 3. <用户配置目录>/pie_host/config.toml
    /// 4. 使用默认配置
    ///
    /// 找到的配置随后由环境变量覆盖。此时日志尚未初始化，
    /// 来源与被跳过的文件由调用者在日志就绪后报告。
    pub fn load_or_default() -> ConfigDiscovery {
        let user_config = dirs::config_dir().map(|dir| dir.join("pie_host").join("config.toml"));
        let mut discovery = Self::discover_in(Path::new("."), user_config.as_deref());
        discovery.config.apply_env_overrides();
        discovery
    }

    /// 在 `dir` 与用户配置文件中查找配置
    pub fn discover_in(dir: &Path, user_config: Option<&Path>) -> ConfigDiscovery {
        let mut candidates = vec![
            ConfigSource::Toml(dir.join("pie_host.toml")),
            ConfigSource::Json(dir.join("pie_host.json")),
        ];
        if let Some(path) = user_config {
            candidates.push(ConfigSource::UserDir(path.to_path_buf()));
        }

        let mut rejected = Vec::new();
        for source in candidates {
            let loaded = match &source {
                ConfigSource::Json(path) if path.is_file() => Self::from_json_file(path),
                ConfigSource::Toml(path) | ConfigSource::UserDir(path) if path.is_file() => {
                    Self::from_toml_file(path)
                }
                _ => continue,
            };
            match loaded {
                Ok(config) => {
                    return ConfigDiscovery {
                        config,
                        source,
                        rejected,
                    }
                }
                Err(e) => rejected.push((source, e)),
            }
        }

        ConfigDiscovery {
            config: Self::default(),
            source: ConfigSource::Default,
            rejected,
        }
    }
}

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Toml(PathBuf),
    Json(PathBuf),
    UserDir(PathBuf),
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Toml(path) | ConfigSource::Json(path) | ConfigSource::UserDir(path) => {
                write!(f, "{}", path.display())
            }
            ConfigSource::Default => write!(f, "defaults"),
        }
    }
}

/// 配置查找结果
#[derive(Debug)]
pub struct ConfigDiscovery {
    pub config: HostConfig,
    pub source: ConfigSource,
    /// 存在但无法解析而被跳过的文件
    pub rejected: Vec<(ConfigSource, ConfigError)>,
}

impl ConfigDiscovery {
    /// 在日志初始化之后报告查找过程
    pub fn report(&self) {
        for (source, error) in &self.rejected {
            tracing::warn!(target: "config", "Skipped {}: {}", source, error);
        }
        tracing::info!(target: "config", "Loaded config from {}", self.source);
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别，`RUST_LOG` 未设置时生效
    pub level: LogLevel,
}

use crate::impl_default;

impl_default!(LoggingConfig {
    level: LogLevel::Info,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 对应的 `EnvFilter` 指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::ParseError(format!("unknown log level '{}'", other))),
        }
    }
}
