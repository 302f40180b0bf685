//! 嵌入前预检
//!
//! 检查句柄是否非零、是否仍然存活、是否属于当前进程。
//! 跨进程重设父窗口的失败方式隐蔽且依赖宿主，因此直接拒绝而不尝试。

use crate::native::NativeWindowHandle;
use crate::platform::WindowSystem;
use thiserror::Error;

/// 拒绝嵌入的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("window handle is zero")]
    NullHandle,

    #[error("handle {0} does not refer to a live window")]
    StaleHandle(NativeWindowHandle),

    #[error(
        "window belongs to another process (pid={owner_pid}, current pid={current_pid}); \
         cross-process embedding is not supported"
    )]
    CrossProcess { owner_pid: u32, current_pid: u32 },

    #[error("window is already embedded")]
    AlreadyEmbedded,

    #[error("host surface has no native window")]
    NoHostSurface,
}

impl RejectReason {
    pub fn is_cross_process(&self) -> bool {
        matches!(self, RejectReason::CrossProcess { .. })
    }
}

/// 非致命警告
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreflightWarning {
    /// 窗口当前隐藏，嵌入后可能不可见
    Hidden,
}

/// 预检报告
#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub handle: NativeWindowHandle,
    pub verdict: Result<(), RejectReason>,
    pub warnings: Vec<PreflightWarning>,
}

impl PreflightReport {
    pub fn is_ok(&self) -> bool {
        self.verdict.is_ok()
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        self.verdict.as_ref().err()
    }
}

/// 验证句柄是否可以嵌入
pub fn validate_for_embedding(
    window_system: &dyn WindowSystem,
    handle: NativeWindowHandle,
) -> PreflightReport {
    let mut warnings = Vec::new();
    let verdict = check(window_system, handle, &mut warnings);

    match &verdict {
        Ok(()) => tracing::debug!(target: "preflight", "Handle {} passed preflight", handle),
        Err(reason) => tracing::warn!(target: "preflight", "Handle {} rejected: {}", handle, reason),
    }

    PreflightReport {
        handle,
        verdict,
        warnings,
    }
}

fn check(
    window_system: &dyn WindowSystem,
    handle: NativeWindowHandle,
    warnings: &mut Vec<PreflightWarning>,
) -> Result<(), RejectReason> {
    if handle.is_null() {
        return Err(RejectReason::NullHandle);
    }

    if !window_system.is_window(handle) {
        return Err(RejectReason::StaleHandle(handle));
    }

    if !window_system.is_visible(handle) {
        tracing::warn!(target: "preflight", "Window {} is hidden and may not appear", handle);
        warnings.push(PreflightWarning::Hidden);
    }

    // 所属进程未知 (0) 时不拒绝
    let owner_pid = window_system.owner_process_id(handle);
    let current_pid = window_system.current_process_id();
    if owner_pid != 0 && owner_pid != current_pid {
        return Err(RejectReason::CrossProcess {
            owner_pid,
            current_pid,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDesktop;

    #[test]
    fn test_null_handle() {
        let desktop = FakeDesktop::new();
        let report = validate_for_embedding(&desktop.window_system(), NativeWindowHandle::NULL);
        assert_eq!(report.reason(), Some(&RejectReason::NullHandle));
    }

    #[test]
    fn test_stale_handle() {
        let desktop = FakeDesktop::new();
        let handle = NativeWindowHandle::from_raw(0x404);
        let report = validate_for_embedding(&desktop.window_system(), handle);
        assert_eq!(report.reason(), Some(&RejectReason::StaleHandle(handle)));
    }

    #[test]
    fn test_hidden_window_warns_but_passes() {
        let desktop = FakeDesktop::new();
        let handle = desktop.spawn_window(desktop.current_pid(), false);
        let report = validate_for_embedding(&desktop.window_system(), handle);
        assert!(report.is_ok());
        assert_eq!(report.warnings, vec![PreflightWarning::Hidden]);
    }

    #[test]
    fn test_cross_process_window_is_rejected() {
        let desktop = FakeDesktop::new();
        let foreign_pid = desktop.current_pid() + 1;
        let handle = desktop.spawn_window(foreign_pid, true);

        let report = validate_for_embedding(&desktop.window_system(), handle);
        let reason = report.reason().expect("rejected");
        assert!(reason.is_cross_process());
        assert!(reason.to_string().contains("another process"));
    }

    #[test]
    fn test_unknown_owner_is_allowed() {
        let desktop = FakeDesktop::new();
        let handle = desktop.spawn_window(0, true);
        assert!(validate_for_embedding(&desktop.window_system(), handle).is_ok());
    }
}
