//! 平台抽象层
//!
//! - `win32` - Windows 窗口系统
//! - `headless` - 其他平台上的无窗口实现
//! - `winit` - 基于 winit 的宿主窗口

pub mod headless;
pub mod winit;

#[cfg(windows)]
pub mod win32;

use crate::core::error::PlatformResult;
use crate::native::NativeWindowHandle;
use raw_window_handle::RawWindowHandle;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

pub use headless::HeadlessWindowSystem;
pub use self::winit::WinitHostSurface;
#[cfg(windows)]
pub use win32::Win32WindowSystem;

// ============================================================================
// Window Style
// ============================================================================

/// 窗口样式位
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowStyle(u32);

impl WindowStyle {
    pub const OVERLAPPED_WINDOW: Self = Self(0x00CF_0000);
    pub const CLIP_CHILDREN: Self = Self(0x0200_0000);
    pub const CLIP_SIBLINGS: Self = Self(0x0400_0000);
    pub const VISIBLE: Self = Self(0x1000_0000);
    pub const CHILD: Self = Self(0x4000_0000);
    pub const POPUP: Self = Self(0x8000_0000);

    /// 嵌入后的子窗口样式
    ///
    /// 重设父窗口后残留的顶层样式会让硬件加速的子窗口出现不完整重绘。
    pub const EMBEDDED: Self = Self(
        Self::CHILD.0 | Self::VISIBLE.0 | Self::CLIP_SIBLINGS.0 | Self::CLIP_CHILDREN.0,
    );

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for WindowStyle {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for WindowStyle {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for WindowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(WindowStyle, &str); 5] = [
            (WindowStyle::CHILD, "CHILD"),
            (WindowStyle::POPUP, "POPUP"),
            (WindowStyle::VISIBLE, "VISIBLE"),
            (WindowStyle::CLIP_SIBLINGS, "CLIP_SIBLINGS"),
            (WindowStyle::CLIP_CHILDREN, "CLIP_CHILDREN"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "WindowStyle(0x{:08X} {})", self.0, names.join(" | "))
    }
}

// ============================================================================
// Bounds
// ============================================================================

/// 宿主坐标系中的布局边界
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 原点处的边界
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// 转换为整数像素矩形（向零截断）
    pub fn to_pixels(&self) -> (i32, i32, i32, i32) {
        (
            self.x as i32,
            self.y as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}

// ============================================================================
// Window System Abstraction
// ============================================================================

/// 窗口系统抽象 - 预检与嵌入所需的窗口操作
pub trait WindowSystem {
    /// 句柄是否仍指向存活窗口
    fn is_window(&self, handle: NativeWindowHandle) -> bool;

    fn is_visible(&self, handle: NativeWindowHandle) -> bool;

    /// 窗口所属进程，未知时为 0
    fn owner_process_id(&self, handle: NativeWindowHandle) -> u32;

    fn current_process_id(&self) -> u32;

    fn set_parent(
        &self,
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
    ) -> PlatformResult<()>;

    fn set_style(&self, handle: NativeWindowHandle, style: WindowStyle) -> PlatformResult<()>;

    fn move_window(&self, handle: NativeWindowHandle, bounds: Bounds) -> PlatformResult<()>;
}

/// 当前平台的窗口系统
#[cfg(windows)]
pub fn default_window_system() -> Box<dyn WindowSystem> {
    Box::new(Win32WindowSystem::new())
}

/// 当前平台的窗口系统
#[cfg(not(windows))]
pub fn default_window_system() -> Box<dyn WindowSystem> {
    Box::new(HeadlessWindowSystem::new())
}

/// 从 raw-window-handle 中取出可作为父窗口的句柄
pub fn parent_from_raw(raw: RawWindowHandle) -> Option<NativeWindowHandle> {
    match raw {
        RawWindowHandle::Win32(handle) => Some(NativeWindowHandle::from_raw(handle.hwnd.get())),
        RawWindowHandle::Xlib(handle) if handle.window != 0 => {
            Some(NativeWindowHandle::from_raw(handle.window as isize))
        }
        _ => None,
    }
}
