use std::sync::Arc;
use winit::event_loop::EventLoop;
use winit::window::{Window as WinitWindowRaw, WindowBuilder};
use winit::dpi::LogicalSize;
use raw_window_handle::HasWindowHandle;

use super::{parent_from_raw, Bounds};
use crate::config::WindowConfig;
use crate::core::error::{HostError, HostResult};
use crate::embedding::HostSurface;
use crate::native::NativeWindowHandle;

/// 基于 winit 窗口的宿主表面
#[derive(Clone)]
pub struct WinitHostSurface {
    window: Arc<WinitWindowRaw>,
}

impl WinitHostSurface {
    pub fn new(event_loop: &EventLoop<()>, config: &WindowConfig) -> HostResult<Self> {
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .build(event_loop)
            .map_err(|e| HostError::Window(e.to_string()))?;
        Ok(Self {
            window: Arc::new(window),
        })
    }

    pub fn raw(&self) -> &WinitWindowRaw {
        &self.window
    }

    /// 当前客户区对应的布局边界
    pub fn client_bounds(&self) -> Bounds {
        let size = self.window.inner_size();
        Bounds::from_size(f64::from(size.width), f64::from(size.height))
    }
}

impl HostSurface for WinitHostSurface {
    fn parent_handle(&self) -> NativeWindowHandle {
        self.window
            .window_handle()
            .ok()
            .and_then(|handle| parent_from_raw(handle.as_raw()))
            .unwrap_or(NativeWindowHandle::NULL)
    }
}
