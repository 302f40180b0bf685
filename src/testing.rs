//! 测试替身
//!
//! 脚本化的原生模块、窗口系统和宿主表面，共享同一个模拟桌面状态，
//! 用于在没有真实原生模块的环境中驱动生命周期。

use crate::core::error::{HostError, HostResult, PlatformError, PlatformResult};
use crate::diagnostics::pe::{stub_image, MACHINE_AMD64, MACHINE_I386};
use crate::diagnostics::{Bitness, DiagnosticResult, Diagnosis};
use crate::embedding::HostSurface;
use crate::native::{ModuleLoader, NativeModule, NativeWindowHandle, TickCallback};
use crate::play::PlayGame;
use crate::platform::{Bounds, WindowStyle, WindowSystem};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// 对模拟桌面的一次调用
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopCall {
    Create,
    Show,
    Hide,
    Destroy,
    Pump,
    SetTickCallback(bool),
    IsRunning,
    RequestPlay(bool),
    SetParent {
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
    },
    SetStyle {
        handle: NativeWindowHandle,
        style: WindowStyle,
    },
    Move {
        handle: NativeWindowHandle,
        bounds: Bounds,
    },
}

#[derive(Debug, Clone)]
struct FakeWindow {
    owner_pid: u32,
    visible: bool,
    style: WindowStyle,
    parent: NativeWindowHandle,
    moves: Vec<Bounds>,
}

#[derive(Default)]
struct DesktopState {
    calls: Vec<DesktopCall>,
    windows: HashMap<NativeWindowHandle, FakeWindow>,
    next_handle: isize,
    module_window: NativeWindowHandle,
    callback: Option<TickCallback>,
    running: bool,
    queued_ticks: VecDeque<f32>,
    create_failure: Option<i32>,
    last_error: Option<i32>,
    fault_on_pump: bool,
    fault_on_show: bool,
    window_owner: Option<u32>,
    play_exports: bool,
    load_failure: Option<i32>,
    loads: usize,
}

/// 模拟桌面
///
/// 克隆共享同一份状态。
#[derive(Clone, Default)]
pub struct FakeDesktop {
    state: Rc<RefCell<DesktopState>>,
}

impl FakeDesktop {
    pub fn new() -> Self {
        let desktop = Self::default();
        desktop.state.borrow_mut().next_handle = 0x1000;
        desktop
    }

    /// 作用于本桌面的原生模块
    pub fn module(&self) -> FakeNativeModule {
        FakeNativeModule {
            desktop: self.clone(),
        }
    }

    pub fn window_system(&self) -> FakeWindowSystem {
        FakeWindowSystem {
            desktop: self.clone(),
        }
    }

    /// 指向 `path` 的加载器，文件存在即视为可加载
    pub fn loader(&self, path: impl Into<PathBuf>) -> FakeLoader {
        FakeLoader {
            desktop: self.clone(),
            path: path.into(),
        }
    }

    pub fn current_pid(&self) -> u32 {
        std::process::id()
    }

    /// 在桌面上放置一个窗口
    pub fn spawn_window(&self, owner_pid: u32, visible: bool) -> NativeWindowHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 0x10;
        let handle = NativeWindowHandle::from_raw(state.next_handle);
        state.windows.insert(
            handle,
            FakeWindow {
                owner_pid,
                visible,
                style: WindowStyle::OVERLAPPED_WINDOW,
                parent: NativeWindowHandle::NULL,
                moves: Vec::new(),
            },
        );
        handle
    }

    /// 从外部关闭窗口，句柄随之失效
    pub fn close_window(&self, handle: NativeWindowHandle) {
        self.state.borrow_mut().windows.remove(&handle);
    }

    pub fn calls(&self) -> Vec<DesktopCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn count(&self, call: &DesktopCall) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == call).count()
    }

    pub fn registered_callback(&self) -> Option<TickCallback> {
        self.state.borrow().callback
    }

    pub fn style_of(&self, handle: NativeWindowHandle) -> Option<WindowStyle> {
        self.state.borrow().windows.get(&handle).map(|w| w.style)
    }

    pub fn parent_of(&self, handle: NativeWindowHandle) -> Option<NativeWindowHandle> {
        self.state.borrow().windows.get(&handle).map(|w| w.parent)
    }

    pub fn is_visible(&self, handle: NativeWindowHandle) -> bool {
        self.state
            .borrow()
            .windows
            .get(&handle)
            .is_some_and(|w| w.visible)
    }

    pub fn moves_of(&self, handle: NativeWindowHandle) -> Vec<Bounds> {
        self.state
            .borrow()
            .windows
            .get(&handle)
            .map(|w| w.moves.clone())
            .unwrap_or_default()
    }

    /// 设置原生侧播放标志
    pub fn set_running(&self, running: bool) {
        self.state.borrow_mut().running = running;
    }

    /// 下一次消息循环迭代时通过回调送达的节拍增量
    pub fn queue_ticks(&self, deltas: &[f32]) {
        self.state.borrow_mut().queued_ticks.extend(deltas.iter().copied());
    }

    /// 让下一次创建失败并报告给定错误码，`None` 恢复正常
    pub fn fail_create(&self, last_error: Option<i32>) {
        self.state.borrow_mut().create_failure = last_error;
    }

    /// 让消息循环迭代发生故障
    pub fn fault_on_pump(&self, fault: bool) {
        self.state.borrow_mut().fault_on_pump = fault;
    }

    /// 让显示调用发生故障
    pub fn fault_on_show(&self, fault: bool) {
        self.state.borrow_mut().fault_on_show = fault;
    }

    /// 原生模块创建的窗口归属于给定进程，`None` 为当前进程
    pub fn create_windows_owned_by(&self, pid: Option<u32>) {
        self.state.borrow_mut().window_owner = pid;
    }

    /// 是否导出 StartPie/StopPie
    pub fn with_play_exports(&self, exported: bool) {
        self.state.borrow_mut().play_exports = exported;
    }

    /// 让加载失败并报告给定错误码，`None` 恢复正常
    pub fn fail_load(&self, code: Option<i32>) {
        self.state.borrow_mut().load_failure = code;
    }

    pub fn loads(&self) -> usize {
        self.state.borrow().loads
    }

    fn record(&self, call: DesktopCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn module_window_mut<R>(&self, f: impl FnOnce(&mut FakeWindow) -> R) -> Option<R> {
        let mut state = self.state.borrow_mut();
        let handle = state.module_window;
        state.windows.get_mut(&handle).map(f)
    }
}

// ============================================================================
// Native Module
// ============================================================================

/// 脚本化的原生模块
pub struct FakeNativeModule {
    desktop: FakeDesktop,
}

impl NativeModule for FakeNativeModule {
    fn create_window(&mut self) -> NativeWindowHandle {
        self.desktop.record(DesktopCall::Create);
        let failure = self.desktop.state.borrow_mut().create_failure.take();
        if let Some(code) = failure {
            let mut state = self.desktop.state.borrow_mut();
            state.last_error = Some(code);
            return NativeWindowHandle::NULL;
        }

        let owner = self.desktop.state.borrow().window_owner;
        let handle = self
            .desktop
            .spawn_window(owner.unwrap_or_else(|| self.desktop.current_pid()), false);
        let mut state = self.desktop.state.borrow_mut();
        state.module_window = handle;
        state.last_error = None;
        handle
    }

    fn show_window(&mut self) {
        self.desktop.record(DesktopCall::Show);
        if self.desktop.state.borrow().fault_on_show {
            panic!("access violation in ShowNativeWindow");
        }
        self.desktop.module_window_mut(|w| w.visible = true);
    }

    fn hide_window(&mut self) {
        self.desktop.record(DesktopCall::Hide);
        self.desktop.module_window_mut(|w| w.visible = false);
    }

    fn destroy_window(&mut self) {
        self.desktop.record(DesktopCall::Destroy);
        let mut state = self.desktop.state.borrow_mut();
        let handle = std::mem::take(&mut state.module_window);
        state.windows.remove(&handle);
    }

    fn pump_messages(&mut self) {
        self.desktop.record(DesktopCall::Pump);
        if self.desktop.state.borrow().fault_on_pump {
            panic!("access violation in MessageLoopIteration");
        }

        let (callback, deltas) = {
            let mut state = self.desktop.state.borrow_mut();
            match state.callback {
                Some(callback) => (Some(callback), state.queued_ticks.drain(..).collect()),
                None => (None, Vec::new()),
            }
        };
        if let Some(callback) = callback {
            for delta in deltas {
                callback(delta);
            }
        }
    }

    fn set_tick_callback(&mut self, callback: Option<TickCallback>) {
        self.desktop
            .record(DesktopCall::SetTickCallback(callback.is_some()));
        self.desktop.state.borrow_mut().callback = callback;
    }

    fn is_running(&mut self) -> bool {
        self.desktop.record(DesktopCall::IsRunning);
        self.desktop.state.borrow().running
    }

    fn last_error(&self) -> Option<i32> {
        self.desktop.state.borrow().last_error
    }

    fn request_play(&mut self, start: bool) -> HostResult<()> {
        if !self.desktop.state.borrow().play_exports {
            let name = if start { "StartPie" } else { "StopPie" };
            return Err(HostError::EntryPointMissing(name.to_string()));
        }
        self.desktop.record(DesktopCall::RequestPlay(start));
        self.desktop.set_running(start);
        Ok(())
    }
}

/// 模拟模块的加载器
pub struct FakeLoader {
    desktop: FakeDesktop,
    path: PathBuf,
}

impl ModuleLoader for FakeLoader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn probe(&self) -> DiagnosticResult {
        if !self.path.is_file() {
            return DiagnosticResult::failure(
                &self.path,
                Diagnosis::ModuleMissing,
                format!("Module not found: {}", self.path.display()),
            );
        }
        match self.desktop.state.borrow().load_failure {
            Some(code) => DiagnosticResult::failure(
                &self.path,
                Diagnosis::ModuleLoadFailure { code: Some(code) },
                io::Error::from_raw_os_error(code).to_string(),
            ),
            None => DiagnosticResult::loadable(&self.path),
        }
    }

    fn load(&mut self) -> HostResult<Box<dyn NativeModule>> {
        self.desktop.state.borrow_mut().loads += 1;
        Ok(Box::new(self.desktop.module()))
    }
}

// ============================================================================
// Window System
// ============================================================================

/// 作用于模拟桌面的窗口系统
pub struct FakeWindowSystem {
    desktop: FakeDesktop,
}

impl FakeWindowSystem {
    fn with_window<R>(
        &self,
        handle: NativeWindowHandle,
        call: &'static str,
        f: impl FnOnce(&mut FakeWindow) -> R,
    ) -> PlatformResult<R> {
        self.desktop
            .state
            .borrow_mut()
            .windows
            .get_mut(&handle)
            .map(f)
            .ok_or(PlatformError::CallFailed { call, code: 1400 })
    }
}

impl WindowSystem for FakeWindowSystem {
    fn is_window(&self, handle: NativeWindowHandle) -> bool {
        self.desktop.state.borrow().windows.contains_key(&handle)
    }

    fn is_visible(&self, handle: NativeWindowHandle) -> bool {
        self.desktop.is_visible(handle)
    }

    fn owner_process_id(&self, handle: NativeWindowHandle) -> u32 {
        self.desktop
            .state
            .borrow()
            .windows
            .get(&handle)
            .map_or(0, |w| w.owner_pid)
    }

    fn current_process_id(&self) -> u32 {
        self.desktop.current_pid()
    }

    fn set_parent(
        &self,
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
    ) -> PlatformResult<()> {
        self.desktop.record(DesktopCall::SetParent { child, parent });
        self.with_window(child, "SetParent", |w| w.parent = parent)
    }

    fn set_style(&self, handle: NativeWindowHandle, style: WindowStyle) -> PlatformResult<()> {
        self.desktop.record(DesktopCall::SetStyle { handle, style });
        self.with_window(handle, "SetWindowLongW", |w| w.style = style)
    }

    fn move_window(&self, handle: NativeWindowHandle, bounds: Bounds) -> PlatformResult<()> {
        self.desktop.record(DesktopCall::Move { handle, bounds });
        self.with_window(handle, "MoveWindow", |w| w.moves.push(bounds))
    }
}

// ============================================================================
// Host Surface
// ============================================================================

/// 固定父句柄的宿主表面
#[derive(Debug, Clone, Copy)]
pub struct FakeSurface {
    parent: NativeWindowHandle,
}

impl FakeSurface {
    pub fn new(parent: NativeWindowHandle) -> Self {
        Self { parent }
    }
}

impl HostSurface for FakeSurface {
    fn parent_handle(&self) -> NativeWindowHandle {
        self.parent
    }
}

// ============================================================================
// Play Game
// ============================================================================

/// 模拟实现收到的调用
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameCall {
    Start,
    Tick(f32),
    Stop,
}

/// 记录调用的模拟实现，克隆共享同一份记录
#[derive(Debug, Clone, Default)]
pub struct RecordingGame {
    calls: Rc<RefCell<Vec<GameCall>>>,
}

impl RecordingGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GameCall> {
        self.calls.borrow().clone()
    }

    pub fn starts(&self) -> usize {
        self.count(|c| matches!(c, GameCall::Start))
    }

    pub fn stops(&self) -> usize {
        self.count(|c| matches!(c, GameCall::Stop))
    }

    pub fn ticks(&self) -> Vec<f32> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                GameCall::Tick(dt) => Some(*dt),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&GameCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| predicate(c)).count()
    }
}

impl PlayGame for RecordingGame {
    fn start(&mut self) {
        self.calls.borrow_mut().push(GameCall::Start);
    }

    fn tick(&mut self, delta_seconds: f32) {
        self.calls.borrow_mut().push(GameCall::Tick(delta_seconds));
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push(GameCall::Stop);
    }
}

// ============================================================================
// Module Files
// ============================================================================

/// 在 `dir` 下写入给定位宽的模块文件
pub fn write_module(dir: &Path, name: &str, bitness: Bitness) -> io::Result<PathBuf> {
    let machine = match bitness {
        Bitness::Bits64 => MACHINE_AMD64,
        Bitness::Bits32 => MACHINE_I386,
    };
    let path = dir.join(name);
    std::fs::write(&path, stub_image(machine))?;
    Ok(path)
}
