//! 基于 `libloading` 的原生模块绑定

use super::{ModuleLoader, NativeModule, NativeWindowHandle, TickCallback};
use crate::core::error::{HostError, HostResult};
use libloading::{Library, Symbol};
use std::io;
use std::path::{Path, PathBuf};

pub const EXPORT_CREATE: &str = "CreateNativeWindow";
pub const EXPORT_SHOW: &str = "ShowNativeWindow";
pub const EXPORT_HIDE: &str = "HideNativeWindow";
pub const EXPORT_DESTROY: &str = "DestroyNativeWindow";
pub const EXPORT_PUMP: &str = "MessageLoopIteration";
pub const EXPORT_SET_TICK_CALLBACK: &str = "SetPieTickCallback";
pub const EXPORT_IS_RUNNING: &str = "IsPieRunning";
pub const EXPORT_START_PLAY: &str = "StartPie";
pub const EXPORT_STOP_PLAY: &str = "StopPie";

type CreateFn = unsafe extern "C" fn() -> isize;
type VoidFn = unsafe extern "C" fn();
type SetTickCallbackFn = unsafe extern "C" fn(Option<TickCallback>);
type IsRunningFn = unsafe extern "C" fn() -> i32;

/// 加载失败信息
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub code: Option<i32>,
    pub message: String,
}

impl LoadFailure {
    fn from_error(err: libloading::Error) -> Self {
        let code = std::error::Error::source(&err)
            .and_then(|source| source.downcast_ref::<io::Error>())
            .and_then(io::Error::raw_os_error);
        // 有系统错误码时使用系统提供的消息文本
        let message = match code {
            Some(code) => io::Error::from_raw_os_error(code).to_string(),
            None => err.to_string(),
        };
        Self { code, message }
    }
}

/// 打开模块，依赖从模块自身所在目录解析
#[cfg(windows)]
pub fn open_library(path: &Path) -> Result<Library, LoadFailure> {
    use libloading::os::windows::{Library as WindowsLibrary, LOAD_WITH_ALTERED_SEARCH_PATH};

    let library = unsafe { WindowsLibrary::load_with_flags(path, LOAD_WITH_ALTERED_SEARCH_PATH) }
        .map_err(LoadFailure::from_error)?;
    Ok(library.into())
}

/// 打开模块，依赖从模块自身所在目录解析
#[cfg(unix)]
pub fn open_library(path: &Path) -> Result<Library, LoadFailure> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LOCAL, RTLD_NOW};

    // 带目录的路径不会经过动态链接器的搜索路径
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let library = unsafe { UnixLibrary::open(Some(&path), RTLD_NOW | RTLD_LOCAL) }
        .map_err(LoadFailure::from_error)?;
    Ok(library.into())
}

struct Exports {
    create: CreateFn,
    show: VoidFn,
    hide: VoidFn,
    destroy: VoidFn,
    pump: VoidFn,
    set_tick_callback: SetTickCallbackFn,
    is_running: IsRunningFn,
    start_play: Option<VoidFn>,
    stop_play: Option<VoidFn>,
}

unsafe fn required<T: Copy>(library: &Library, name: &str) -> HostResult<T> {
    let symbol: Symbol<T> = library
        .get(name.as_bytes())
        .map_err(|_| HostError::EntryPointMissing(name.to_string()))?;
    Ok(*symbol)
}

unsafe fn optional<T: Copy>(library: &Library, name: &str) -> Option<T> {
    library.get::<T>(name.as_bytes()).ok().map(|symbol| *symbol)
}

/// 已绑定的原生模块
///
/// 函数指针在 `library` 存活期间有效，模块随结构体一起卸载。
pub struct LibraryModule {
    exports: Exports,
    last_error: Option<i32>,
    path: PathBuf,
    _library: Library,
}

impl LibraryModule {
    /// 加载模块并解析导出函数
    pub fn open(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();
        let library = open_library(path).map_err(|failure| HostError::ModuleLoadFailure {
            path: path.to_path_buf(),
            code: failure.code,
            message: failure.message,
        })?;

        let exports = unsafe {
            Exports {
                create: required(&library, EXPORT_CREATE)?,
                show: required(&library, EXPORT_SHOW)?,
                hide: required(&library, EXPORT_HIDE)?,
                destroy: required(&library, EXPORT_DESTROY)?,
                pump: required(&library, EXPORT_PUMP)?,
                set_tick_callback: required(&library, EXPORT_SET_TICK_CALLBACK)?,
                is_running: required(&library, EXPORT_IS_RUNNING)?,
                start_play: optional(&library, EXPORT_START_PLAY),
                stop_play: optional(&library, EXPORT_STOP_PLAY),
            }
        };

        tracing::info!(target: "lifecycle", "Bound native module {}", path.display());
        Ok(Self {
            exports,
            last_error: None,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NativeModule for LibraryModule {
    fn create_window(&mut self) -> NativeWindowHandle {
        let raw = unsafe { (self.exports.create)() };
        self.last_error = if raw == 0 { captured_last_error() } else { None };
        NativeWindowHandle::from_raw(raw)
    }

    fn show_window(&mut self) {
        unsafe { (self.exports.show)() }
    }

    fn hide_window(&mut self) {
        unsafe { (self.exports.hide)() }
    }

    fn destroy_window(&mut self) {
        unsafe { (self.exports.destroy)() }
    }

    fn pump_messages(&mut self) {
        unsafe { (self.exports.pump)() }
    }

    fn set_tick_callback(&mut self, callback: Option<TickCallback>) {
        unsafe { (self.exports.set_tick_callback)(callback) }
    }

    fn is_running(&mut self) -> bool {
        unsafe { (self.exports.is_running)() != 0 }
    }

    fn last_error(&self) -> Option<i32> {
        self.last_error
    }

    fn request_play(&mut self, start: bool) -> HostResult<()> {
        let (export, name) = if start {
            (self.exports.start_play, EXPORT_START_PLAY)
        } else {
            (self.exports.stop_play, EXPORT_STOP_PLAY)
        };
        let call = export.ok_or_else(|| HostError::EntryPointMissing(name.to_string()))?;
        unsafe { call() };
        Ok(())
    }
}

#[cfg(windows)]
fn captured_last_error() -> Option<i32> {
    io::Error::last_os_error().raw_os_error()
}

#[cfg(not(windows))]
fn captured_last_error() -> Option<i32> {
    None
}

/// 从文件路径加载模块
pub struct LibraryLoader {
    path: PathBuf,
}

impl LibraryLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModuleLoader for LibraryLoader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> HostResult<Box<dyn NativeModule>> {
        Ok(Box::new(LibraryModule::open(&self.path)?))
    }
}
