//! 原生窗口生命周期
//!
//! 唯一修改规范句柄的组件。状态机为 `None → Created → Destroyed`，
//! `Destroyed` 之后可以开始新的 `Created` 周期。
//!
//! # 创建顺序
//!
//! 1. 模块文件存在性
//! 2. 模块位宽与进程位宽一致（不一致时原生调用会直接终止进程）
//! 3. 加载探测
//! 4. 绑定模块（每个生命周期对象只绑定一次）
//! 5. `CreateNativeWindow`
//! 6. 注册节拍回调
//!
//! # 销毁顺序
//!
//! 取下嵌入适配器，清除节拍回调，强制停止播放会话，执行唯一一次原生销毁，
//! 最后把本地句柄归零。句柄已为零时销毁是空操作。

use crate::core::error::{HostError, HostResult};
use crate::core::status::{Operation, StatusBoard};
use crate::diagnostics::check_architecture;
use crate::embedding::{
    adopt, validate_for_embedding, EmbeddingAdapter, EmbeddingState, HostSurface, RejectReason,
};
use crate::native::{guarded, ModuleLoader, NativeModule, NativeWindowHandle, TickCallbackRegistration};
use crate::play::{PlayGame, PlaySessionController, PlayState, PlayTransition, TickTarget};
use crate::platform::{Bounds, WindowSystem};

/// 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    None,
    Created,
    Destroyed,
}

/// 原生窗口生命周期所有者
pub struct Lifecycle {
    loader: Box<dyn ModuleLoader>,
    module: Option<Box<dyn NativeModule>>,
    window_system: Box<dyn WindowSystem>,
    handle: NativeWindowHandle,
    state: LifecycleState,
    embedding: Option<EmbeddingAdapter>,
    registration: Option<TickCallbackRegistration>,
    controller: PlaySessionController,
    status: StatusBoard,
    detach_before_destroy: bool,
}

impl Lifecycle {
    pub fn new(
        loader: Box<dyn ModuleLoader>,
        window_system: Box<dyn WindowSystem>,
        game: Box<dyn PlayGame>,
    ) -> Self {
        Self {
            loader,
            module: None,
            window_system,
            handle: NativeWindowHandle::NULL,
            state: LifecycleState::None,
            embedding: None,
            registration: None,
            controller: PlaySessionController::new(game),
            status: StatusBoard::new(),
            detach_before_destroy: false,
        }
    }

    /// 原生销毁前是否先解除父子关系
    pub fn with_detach_before_destroy(mut self, detach: bool) -> Self {
        self.detach_before_destroy = detach;
        self
    }

    pub fn handle(&self) -> NativeWindowHandle {
        self.handle
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// 收养且显示成功后才算已嵌入
    pub fn embedding_state(&self) -> EmbeddingState {
        match self.embedding.as_ref() {
            Some(adapter) if adapter.is_shown() => EmbeddingState::Embedded,
            _ => EmbeddingState::Unembedded,
        }
    }

    pub fn play_state(&self) -> PlayState {
        self.controller.state()
    }

    pub fn controller(&self) -> &PlaySessionController {
        &self.controller
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// 模块是否已绑定
    pub fn is_module_loaded(&self) -> bool {
        self.module.is_some()
    }

    /// 句柄非零且窗口系统仍认为它存活
    pub fn is_window_alive(&self) -> bool {
        !self.handle.is_null() && self.window_system.is_window(self.handle)
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// 创建原生窗口，已存在时返回现有句柄
    pub fn create(&mut self) -> HostResult<NativeWindowHandle> {
        let result = self.try_create();
        self.status
            .record(Operation::Create, &result, |handle| format!("Native window created: {}", handle));
        result
    }

    fn try_create(&mut self) -> HostResult<NativeWindowHandle> {
        if !self.handle.is_null() {
            return Ok(self.handle);
        }

        let path = self.loader.path().to_path_buf();
        if !path.is_file() {
            tracing::error!(target: "lifecycle", "Module not found: {}", path.display());
            return Err(HostError::ModuleMissing { path });
        }

        let bitness = check_architecture(&path)?;
        let probe = self.loader.probe();
        tracing::info!(target: "diagnostics", "{}", probe.message);
        probe.into_result()?;

        let module = match self.module.take() {
            Some(module) => module,
            None => {
                let module = self.loader.load()?;
                tracing::info!(target: "lifecycle", "Bound {} module {}", bitness, path.display());
                module
            }
        };
        let module = self.module.insert(module);

        let handle = guarded("CreateNativeWindow", || module.create_window())?;
        if handle.is_null() {
            let last_error = module.last_error();
            tracing::error!(target: "lifecycle", "CreateNativeWindow returned no window");
            return Err(HostError::NativeFactoryFailure { last_error });
        }

        if let Err(e) = self.register_tick_callback() {
            // 回调未注册的窗口不交给调用者
            if let Err(destroy_err) = destroy_native(self.module.as_mut()) {
                tracing::warn!(target: "lifecycle", "Rollback destroy failed: {}", destroy_err);
            }
            return Err(e);
        }

        self.handle = handle;
        self.state = LifecycleState::Created;
        tracing::info!(target: "lifecycle", "Native window created: {}", handle);
        Ok(handle)
    }

    /// 每个生命周期最多持有一个节拍回调注册
    fn register_tick_callback(&mut self) -> HostResult<()> {
        if self.registration.is_some() {
            return Err(HostError::CallbackAlreadyRegistered);
        }
        let Some(module) = self.module.as_mut() else {
            return Err(HostError::NoWindow);
        };
        self.registration = Some(TickCallbackRegistration::register(module.as_mut())?);
        Ok(())
    }

    // ========================================================================
    // Show / Hide
    // ========================================================================

    pub fn show(&mut self) -> HostResult<()> {
        let result = self.with_window("ShowNativeWindow", |m| m.show_window());
        self.status.record(Operation::Show, &result, |shown| match shown {
            Some(()) => "Window shown".to_string(),
            None => "No window to show".to_string(),
        });
        result.map(|_| ())
    }

    pub fn hide(&mut self) -> HostResult<()> {
        let result = self.with_window("HideNativeWindow", |m| m.hide_window());
        self.status.record(Operation::Hide, &result, |hidden| match hidden {
            Some(()) => "Window hidden".to_string(),
            None => "No window to hide".to_string(),
        });
        result.map(|_| ())
    }

    /// 句柄非零时执行一次受保护的原生调用，否则为空操作
    fn with_window<T>(
        &mut self,
        operation: &'static str,
        call: impl FnOnce(&mut dyn NativeModule) -> T,
    ) -> HostResult<Option<T>> {
        if self.handle.is_null() {
            return Ok(None);
        }
        match self.module.as_mut() {
            Some(module) => guarded(operation, || call(module.as_mut())).map(Some),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Embedding
    // ========================================================================

    /// 预检通过后收养到宿主表面并显示
    pub fn embed(&mut self, surface: &dyn HostSurface) -> HostResult<()> {
        let result = self.try_embed(surface);
        self.status.record(Operation::Embed, &result, |_| {
            format!("Window {} embedded", self.handle)
        });
        result
    }

    fn try_embed(&mut self, surface: &dyn HostSurface) -> HostResult<()> {
        match self.embedding.as_ref().map(EmbeddingAdapter::is_shown) {
            Some(true) => {
                return Err(HostError::EmbeddingRejected(RejectReason::AlreadyEmbedded));
            }
            // 已收养但显示失败，只补发显示
            Some(false) => tracing::debug!(target: "embedding", "Retrying show for {}", self.handle),
            None => {
                let report = validate_for_embedding(self.window_system.as_ref(), self.handle);
                report.verdict.map_err(HostError::EmbeddingRejected)?;
                let adapter = adopt(self.window_system.as_ref(), self.handle, surface)?;
                self.embedding = Some(adapter);
            }
        }

        self.with_window("ShowNativeWindow", |m| m.show_window())?;
        if let Some(adapter) = self.embedding.as_mut() {
            adapter.mark_shown();
        }
        Ok(())
    }

    /// 宿主布局边界变化
    pub fn on_host_bounds_changed(&mut self, bounds: Bounds) -> HostResult<()> {
        let Some(adapter) = self.embedding.as_mut() else {
            return Ok(());
        };
        let result = adapter
            .on_bounds_changed(self.window_system.as_ref(), bounds)
            .map_err(HostError::from);
        if result.is_err() {
            self.status.record(Operation::Resize, &result, |_| String::new());
        }
        result
    }

    // ========================================================================
    // Pump / Tick
    // ========================================================================

    /// 执行一次原生消息循环迭代，仅在句柄非零时有效
    pub fn pump(&mut self) -> HostResult<()> {
        if self.handle.is_null() {
            return Err(HostError::NoWindow);
        }
        self.with_window("MessageLoopIteration", |m| m.pump_messages())?;
        Ok(())
    }

    /// 一个完整节拍：消息循环、转发回调增量、采样播放标志
    pub fn tick(&mut self) -> HostResult<()> {
        let result = self.run_tick();
        if result.is_err() {
            self.status.record(Operation::Tick, &result, |_| String::new());
        }
        result
    }

    fn run_tick(&mut self) -> HostResult<()> {
        self.pump()?;

        if let Some(registration) = self.registration.as_ref() {
            for delta in registration.drain() {
                self.controller.tick(delta);
            }
        }

        let running = self
            .with_window("IsPieRunning", |m| m.is_running())?
            .unwrap_or(false);
        match self.controller.sample(running) {
            Some(PlayTransition::Started) => {
                self.status.success(Operation::PlayStart, "Play session started")
            }
            Some(PlayTransition::Stopped) => {
                self.status.success(Operation::PlayStop, "Play session stopped")
            }
            None => {}
        }
        Ok(())
    }

    /// 请求原生侧开始或停止播放
    ///
    /// 播放状态仍然只由采样到的标志驱动。
    pub fn request_play(&mut self, start: bool) -> HostResult<()> {
        let result = if self.handle.is_null() {
            Err(HostError::NoWindow)
        } else {
            let operation = if start { "StartPie" } else { "StopPie" };
            self.with_window(operation, |m| m.request_play(start))
                .and_then(|requested| requested.unwrap_or(Err(HostError::NoWindow)))
        };
        let message = if start { "Play requested" } else { "Stop requested" };
        self.status
            .record(Operation::PlayRequest, &result, |_| message.to_string());
        result
    }

    // ========================================================================
    // Destroy
    // ========================================================================

    /// 有序拆除，可重复调用
    pub fn destroy(&mut self) -> HostResult<()> {
        if self.handle.is_null() {
            return Ok(());
        }
        let result = self.teardown();
        self.status
            .record(Operation::Destroy, &result, |_| "Native window destroyed".to_string());
        result
    }

    fn teardown(&mut self) -> HostResult<()> {
        let mut first_error: Option<HostError> = None;
        let handle = self.handle;

        let adapter = self.embedding.take();

        if let Some(registration) = self.registration.take() {
            if let Some(module) = self.module.as_mut() {
                if let Err(e) = registration.clear(module.as_mut()) {
                    tracing::warn!(target: "lifecycle", "Clearing tick callback failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(PlayTransition::Stopped) = self.controller.force_stop() {
            self.status
                .success(Operation::PlayStop, "Play session stopped by teardown");
        }

        let module = self.module.as_mut();
        let destroyed = match adapter {
            Some(mut adapter) => adapter
                .dispose(self.window_system.as_ref(), self.detach_before_destroy, || {
                    destroy_native(module)
                })
                .unwrap_or(Ok(())),
            None => destroy_native(module),
        };
        if let Err(e) = destroyed {
            first_error.get_or_insert(e);
        }

        self.handle = NativeWindowHandle::NULL;
        self.state = LifecycleState::Destroyed;
        tracing::info!(target: "lifecycle", "Native window {} destroyed", handle);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn destroy_native(module: Option<&mut Box<dyn NativeModule>>) -> HostResult<()> {
    match module {
        Some(module) => guarded("DestroyNativeWindow", || module.destroy_window()),
        None => Ok(()),
    }
}

impl TickTarget for Lifecycle {
    fn on_tick(&mut self) -> HostResult<()> {
        self.tick()
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            tracing::warn!(target: "lifecycle", "Teardown on drop failed: {}", e);
        }
    }
}
