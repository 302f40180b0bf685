use super::{Bounds, WindowStyle, WindowSystem};
use crate::core::error::{PlatformError, PlatformResult};
use crate::native::NativeWindowHandle;
use windows_sys::Win32::Foundation::{GetLastError, SetLastError};
use windows_sys::Win32::System::Threading::GetCurrentProcessId;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    GetWindowThreadProcessId, IsWindow, IsWindowVisible, MoveWindow, SetParent, SetWindowLongW,
    GWL_STYLE,
};

/// Windows 窗口系统
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }
}

fn last_error(call: &'static str) -> PlatformError {
    // SAFETY: GetLastError only reads thread-local state.
    let code = unsafe { GetLastError() };
    PlatformError::CallFailed { call, code }
}

impl WindowSystem for Win32WindowSystem {
    fn is_window(&self, handle: NativeWindowHandle) -> bool {
        // SAFETY: IsWindow accepts any value and reports whether it names a live window.
        !handle.is_null() && unsafe { IsWindow(handle.raw()) } != 0
    }

    fn is_visible(&self, handle: NativeWindowHandle) -> bool {
        // SAFETY: IsWindowVisible tolerates stale handles.
        unsafe { IsWindowVisible(handle.raw()) != 0 }
    }

    fn owner_process_id(&self, handle: NativeWindowHandle) -> u32 {
        let mut pid = 0u32;
        // SAFETY: pid is a valid out pointer for the duration of the call.
        unsafe { GetWindowThreadProcessId(handle.raw(), &mut pid) };
        pid
    }

    fn current_process_id(&self) -> u32 {
        // SAFETY: no preconditions.
        unsafe { GetCurrentProcessId() }
    }

    fn set_parent(
        &self,
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
    ) -> PlatformResult<()> {
        // SAFETY: both handles were validated by the caller; SetParent reports failure via 0.
        unsafe { SetLastError(0) };
        let previous = unsafe { SetParent(child.raw(), parent.raw()) };
        if previous == 0 && unsafe { GetLastError() } != 0 {
            return Err(last_error("SetParent"));
        }
        Ok(())
    }

    fn set_style(&self, handle: NativeWindowHandle, style: WindowStyle) -> PlatformResult<()> {
        // A zero return is only a failure when the thread error code was set.
        unsafe { SetLastError(0) };
        let previous = unsafe { SetWindowLongW(handle.raw(), GWL_STYLE, style.bits() as i32) };
        if previous == 0 && unsafe { GetLastError() } != 0 {
            return Err(last_error("SetWindowLongW"));
        }
        Ok(())
    }

    fn move_window(&self, handle: NativeWindowHandle, bounds: Bounds) -> PlatformResult<()> {
        let (x, y, width, height) = bounds.to_pixels();
        // SAFETY: plain value arguments; repaint requested.
        let ok = unsafe { MoveWindow(handle.raw(), x, y, width, height, 1) };
        if ok == 0 {
            return Err(last_error("MoveWindow"));
        }
        Ok(())
    }
}
