use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 节拍泵配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    /// 节拍间隔（毫秒）
    pub interval_ms: u64,
}

impl_default!(TickConfig { interval_ms: 16 });

impl TickConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.interval_ms == 0 || self.interval_ms > 1000 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid tick interval: {}ms",
                self.interval_ms
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// 宿主窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 标题
    pub title: String,
    /// 宽度（逻辑像素）
    pub width: u32,
    /// 高度（逻辑像素）
    pub height: u32,
}

impl_default!(WindowConfig {
    title: "Native Window Host".to_string(),
    width: 600,
    height: 500,
});

impl WindowConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(
                "Window size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// 嵌入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// 销毁前是否先解除父子关系
    pub detach_before_destroy: bool,
}

impl_default!(EmbeddingConfig {
    detach_before_destroy: false,
});
