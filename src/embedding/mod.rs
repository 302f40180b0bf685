//! 嵌入宿主
//!
//! 把通过预检的原生窗口收养到宿主表面下：重设父窗口、规范化窗口样式、
//! 转发布局变化，并在拆除时负责唯一一次原生销毁。

pub mod preflight;

pub use preflight::{validate_for_embedding, PreflightReport, PreflightWarning, RejectReason};

use crate::core::error::{HostError, HostResult, PlatformResult};
use crate::native::NativeWindowHandle;
use crate::platform::{Bounds, WindowStyle, WindowSystem};

/// 宿主界面表面
///
/// 接受一个外部拥有的可绘制窗口，并在每次布局时通知边界变化。
pub trait HostSurface {
    /// 作为父窗口的原生句柄，不存在时为空
    fn parent_handle(&self) -> NativeWindowHandle;
}

/// 嵌入状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingState {
    Unembedded,
    Embedded,
}

/// 已收养窗口的适配器
///
/// 收养后窗口的所有权转移到适配器，生命周期所有者不再单独销毁它。
#[derive(Debug)]
pub struct EmbeddingAdapter {
    handle: NativeWindowHandle,
    parent: NativeWindowHandle,
    disposed: bool,
    shown: bool,
    last_bounds: Option<Bounds>,
}

/// 收养窗口
///
/// 调用前必须已经通过 [`validate_for_embedding`]。
pub fn adopt(
    window_system: &dyn WindowSystem,
    handle: NativeWindowHandle,
    surface: &dyn HostSurface,
) -> HostResult<EmbeddingAdapter> {
    let parent = surface.parent_handle();
    if parent.is_null() {
        return Err(HostError::EmbeddingRejected(RejectReason::NoHostSurface));
    }

    window_system.set_parent(handle, parent)?;
    window_system.set_style(handle, WindowStyle::EMBEDDED)?;
    tracing::info!(target: "embedding", "Adopted window {} under host {}", handle, parent);

    Ok(EmbeddingAdapter {
        handle,
        parent,
        disposed: false,
        shown: false,
        last_bounds: None,
    })
}

impl EmbeddingAdapter {
    pub fn handle(&self) -> NativeWindowHandle {
        self.handle
    }

    pub fn parent(&self) -> NativeWindowHandle {
        self.parent
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn last_bounds(&self) -> Option<Bounds> {
        self.last_bounds
    }

    /// 收养后的显示调用是否已成功
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn mark_shown(&mut self) {
        self.shown = true;
    }

    /// 布局边界变化，原样转发为移动/缩放
    pub fn on_bounds_changed(
        &mut self,
        window_system: &dyn WindowSystem,
        bounds: Bounds,
    ) -> PlatformResult<()> {
        if self.disposed || self.handle.is_null() {
            return Ok(());
        }
        window_system.move_window(self.handle, bounds)?;
        self.last_bounds = Some(bounds);
        Ok(())
    }

    /// 拆除：销毁原生窗口，仅执行一次
    ///
    /// 销毁会使句柄失效而与当前父子关系无关，因此解除父子关系是可选的。
    pub fn dispose<T>(
        &mut self,
        window_system: &dyn WindowSystem,
        detach_first: bool,
        destroy: impl FnOnce() -> HostResult<T>,
    ) -> Option<HostResult<T>> {
        if self.disposed {
            return None;
        }
        self.disposed = true;

        if detach_first {
            if let Err(e) = window_system.set_parent(self.handle, NativeWindowHandle::NULL) {
                tracing::warn!(target: "embedding", "Detach before destroy failed: {}", e);
            }
        }

        tracing::info!(target: "embedding", "Destroying adopted window {}", self.handle);
        Some(destroy())
    }
}

impl Drop for EmbeddingAdapter {
    fn drop(&mut self) {
        if !self.disposed {
            tracing::warn!(
                target: "embedding",
                "Adapter for {} dropped without teardown",
                self.handle
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DesktopCall, FakeDesktop, FakeSurface};

    #[test]
    fn test_adopt_reparents_then_normalizes_style() {
        let desktop = FakeDesktop::new();
        let ws = desktop.window_system();
        let handle = desktop.spawn_window(desktop.current_pid(), true);
        let surface = FakeSurface::new(NativeWindowHandle::from_raw(0x77));

        let adapter = adopt(&ws, handle, &surface).unwrap();
        assert_eq!(adapter.parent(), NativeWindowHandle::from_raw(0x77));

        let calls = desktop.calls();
        let reparent = calls
            .iter()
            .position(|c| matches!(c, DesktopCall::SetParent { .. }))
            .unwrap();
        let restyle = calls
            .iter()
            .position(|c| matches!(c, DesktopCall::SetStyle { .. }))
            .unwrap();
        assert!(reparent < restyle);
        assert_eq!(desktop.style_of(handle), Some(WindowStyle::EMBEDDED));
        assert_eq!(desktop.parent_of(handle), Some(NativeWindowHandle::from_raw(0x77)));

        let mut adapter = adapter;
        adapter.dispose(&ws, false, || Ok(()));
    }

    #[test]
    fn test_surface_without_native_window_is_rejected() {
        let desktop = FakeDesktop::new();
        let handle = desktop.spawn_window(desktop.current_pid(), true);
        let surface = FakeSurface::new(NativeWindowHandle::NULL);

        let err = adopt(&desktop.window_system(), handle, &surface).unwrap_err();
        assert!(matches!(
            err,
            HostError::EmbeddingRejected(RejectReason::NoHostSurface)
        ));
    }

    #[test]
    fn test_every_bounds_change_is_forwarded() {
        let desktop = FakeDesktop::new();
        let ws = desktop.window_system();
        let handle = desktop.spawn_window(desktop.current_pid(), true);
        let mut adapter = adopt(&ws, handle, &FakeSurface::new(NativeWindowHandle::from_raw(1))).unwrap();

        let first = Bounds::new(0.0, 0.0, 320.0, 240.0);
        let second = Bounds::new(8.0, 16.0, 640.0, 480.0);
        adapter.on_bounds_changed(&ws, first).unwrap();
        adapter.on_bounds_changed(&ws, second).unwrap();
        adapter.on_bounds_changed(&ws, second).unwrap();

        assert_eq!(desktop.moves_of(handle), vec![first, second, second]);
        assert_eq!(adapter.last_bounds(), Some(second));
        adapter.dispose(&ws, false, || Ok(()));
    }

    #[test]
    fn test_dispose_runs_destroy_once() {
        let desktop = FakeDesktop::new();
        let ws = desktop.window_system();
        let handle = desktop.spawn_window(desktop.current_pid(), true);
        let mut adapter = adopt(&ws, handle, &FakeSurface::new(NativeWindowHandle::from_raw(1))).unwrap();

        let mut destroyed = 0;
        assert!(adapter.dispose(&ws, false, || { destroyed += 1; Ok(()) }).is_some());
        assert!(adapter.dispose(&ws, false, || { destroyed += 1; Ok(()) }).is_none());
        assert_eq!(destroyed, 1);
        assert!(adapter.is_disposed());

        // 已拆除的适配器不再转发布局
        adapter.on_bounds_changed(&ws, Bounds::from_size(1.0, 1.0)).unwrap();
        assert!(desktop.moves_of(handle).is_empty());
    }

    #[test]
    fn test_dispose_can_detach_first() {
        let desktop = FakeDesktop::new();
        let ws = desktop.window_system();
        let handle = desktop.spawn_window(desktop.current_pid(), true);
        let mut adapter = adopt(&ws, handle, &FakeSurface::new(NativeWindowHandle::from_raw(9))).unwrap();

        adapter.dispose(&ws, true, || Ok(()));
        assert_eq!(desktop.parent_of(handle), Some(NativeWindowHandle::NULL));
    }
}
