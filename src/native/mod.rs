//! 原生模块边界
//!
//! 原生模块导出一组固定签名的 C 函数，作用于模块内部唯一的隐式窗口。
//! 本模块把这组导出抽象为 [`NativeModule`]，并提供：
//! - `library` - 基于 `libloading` 的真实模块绑定
//! - `callback` - 节拍回调注册

pub mod callback;
pub mod library;

pub use callback::TickCallbackRegistration;
pub use library::{LibraryLoader, LibraryModule};

use crate::core::error::{HostError, HostResult};
use crate::core::utils::panic_message;
use crate::diagnostics::{probe_module, DiagnosticResult};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// 原生窗口句柄
///
/// 不透明的指针宽度整数，零表示不存在。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeWindowHandle(isize);

impl NativeWindowHandle {
    /// 空句柄
    pub const NULL: Self = Self(0);

    pub const fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> isize {
        self.0
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for NativeWindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeWindowHandle(0x{:X})", self.0)
    }
}

impl fmt::Display for NativeWindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// 原生模块回调的节拍函数
pub type TickCallback = extern "C" fn(f32);

/// 原生模块的导出函数集合
pub trait NativeModule {
    /// 创建窗口，失败时返回空句柄
    fn create_window(&mut self) -> NativeWindowHandle;

    fn show_window(&mut self);

    fn hide_window(&mut self);

    fn destroy_window(&mut self);

    /// 执行一次消息循环迭代
    fn pump_messages(&mut self);

    /// 设置或清除节拍回调
    fn set_tick_callback(&mut self, callback: Option<TickCallback>);

    /// 原生侧播放标志
    fn is_running(&mut self) -> bool;

    /// `create_window` 失败后捕获的系统错误码
    fn last_error(&self) -> Option<i32> {
        None
    }

    /// 请求原生侧开始或停止播放
    fn request_play(&mut self, start: bool) -> HostResult<()> {
        let name = if start { "StartPie" } else { "StopPie" };
        Err(HostError::EntryPointMissing(name.to_string()))
    }
}

/// 原生模块加载器
pub trait ModuleLoader {
    /// 模块文件路径
    fn path(&self) -> &Path;

    /// 可加载性诊断
    fn probe(&self) -> DiagnosticResult {
        probe_module(self.path())
    }

    /// 绑定模块，返回的模块在其生命周期内保持映射
    fn load(&mut self) -> HostResult<Box<dyn NativeModule>>;
}

/// 在保护下执行一次原生调用
///
/// 调用中的 panic 被转换为 `UnexpectedNativeFault`，不会继续展开。
pub fn guarded<T>(operation: &'static str, call: impl FnOnce() -> T) -> HostResult<T> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| {
        let detail = panic_message(payload.as_ref());
        tracing::error!(target: "lifecycle", "Native call {} faulted: {}", operation, detail);
        HostError::UnexpectedNativeFault { operation, detail }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_sentinel() {
        assert!(NativeWindowHandle::NULL.is_null());
        assert!(NativeWindowHandle::default().is_null());
        let handle = NativeWindowHandle::from_raw(0x1F00);
        assert!(!handle.is_null());
        assert_eq!(handle.to_string(), "0x1F00");
    }

    #[test]
    fn test_guarded_converts_panic() {
        let ok = guarded("IsPieRunning", || true);
        assert!(ok.unwrap());

        let fault = guarded("MessageLoopIteration", || -> () { panic!("access violation") });
        match fault {
            Err(HostError::UnexpectedNativeFault { operation, detail }) => {
                assert_eq!(operation, "MessageLoopIteration");
                assert_eq!(detail, "access violation");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }
}
