use super::{Bounds, WindowStyle, WindowSystem};
use crate::core::error::PlatformResult;
use crate::native::NativeWindowHandle;

/// 无窗口系统的平台实现
///
/// 不跟踪任何窗口：任何非零句柄都视为当前进程拥有的可见窗口，
/// 窗口操作直接成功。
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessWindowSystem;

impl HeadlessWindowSystem {
    pub fn new() -> Self {
        Self
    }
}

impl WindowSystem for HeadlessWindowSystem {
    fn is_window(&self, handle: NativeWindowHandle) -> bool {
        !handle.is_null()
    }

    fn is_visible(&self, handle: NativeWindowHandle) -> bool {
        !handle.is_null()
    }

    fn owner_process_id(&self, handle: NativeWindowHandle) -> u32 {
        if handle.is_null() {
            0
        } else {
            std::process::id()
        }
    }

    fn current_process_id(&self) -> u32 {
        std::process::id()
    }

    fn set_parent(
        &self,
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
    ) -> PlatformResult<()> {
        tracing::trace!(target: "platform", "set_parent({}, {}) ignored", child, parent);
        Ok(())
    }

    fn set_style(&self, _handle: NativeWindowHandle, _style: WindowStyle) -> PlatformResult<()> {
        Ok(())
    }

    fn move_window(&self, _handle: NativeWindowHandle, _bounds: Bounds) -> PlatformResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonzero_handles_are_local_windows() {
        let ws = HeadlessWindowSystem::new();
        let handle = NativeWindowHandle::from_raw(5);
        assert!(ws.is_window(handle));
        assert_eq!(ws.owner_process_id(handle), ws.current_process_id());
        assert!(!ws.is_window(NativeWindowHandle::NULL));
    }
}
