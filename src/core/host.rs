//! 独立宿主入口
//!
//! 打开一个 winit 宿主窗口，把原生模块的窗口嵌入其中，并在事件循环里驱动节拍泵。

use crate::config::HostConfig;
use crate::lifecycle::Lifecycle;
use crate::native::LibraryLoader;
use crate::platform::{default_window_system, Bounds, WinitHostSurface};
use crate::play::{SampleGame, TickPump};
use std::time::Instant;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};

use super::error::{HostError, HostResult};

/// 独立宿主
///
/// # 示例
///
/// ```no_run
/// use pie_host::core::Host;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     Host::run()?;
///     Ok(())
/// }
/// ```
pub struct Host;

impl Host {
    /// 运行宿主直到窗口关闭
    pub fn run() -> HostResult<()> {
        let discovery = HostConfig::load_or_default();
        Self::initialize_logging(&discovery.config);
        discovery.report();
        let config = discovery.config;
        config.validate()?;

        let event_loop = EventLoop::new()
            .map_err(|e| HostError::EventLoop(format!("Failed to create event loop: {}", e)))?;
        let surface = WinitHostSurface::new(&event_loop, &config.window)?;

        let mut lifecycle = Lifecycle::new(
            Box::new(LibraryLoader::new(config.module.resolved_path())),
            default_window_system(),
            Box::new(SampleGame::new()),
        )
        .with_detach_before_destroy(config.embedding.detach_before_destroy);

        lifecycle.create()?;
        lifecycle.embed(&surface)?;
        lifecycle.on_host_bounds_changed(surface.client_bounds())?;

        let mut pump = TickPump::new(config.tick.interval());
        pump.start(Instant::now());

        Self::run_event_loop(event_loop, surface, lifecycle, pump)?;

        tracing::info!(target: "lifecycle", "Host shutting down");
        Ok(())
    }

    /// 初始化日志系统
    ///
    /// `RUST_LOG` 优先，未设置时使用配置中的级别。
    fn initialize_logging(config: &HostConfig) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_directive()));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        tracing::info!(target: "lifecycle", "Host starting");
    }

    fn run_event_loop(
        event_loop: EventLoop<()>,
        surface: WinitHostSurface,
        mut lifecycle: Lifecycle,
        mut pump: TickPump,
    ) -> HostResult<()> {
        let result = event_loop.run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => {
                Self::handle_window_event(&event, &mut lifecycle, elwt);
            }
            Event::AboutToWait => {
                if let Err(e) = pump.run_due(Instant::now(), &mut lifecycle) {
                    tracing::warn!(target: "pump", "Tick failed: {}", e);
                }
                if !lifecycle.is_window_alive() {
                    tracing::info!(target: "lifecycle", "Native window is gone, exiting");
                    elwt.exit();
                    return;
                }
                if let Some(deadline) = pump.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
            }
            Event::LoopExiting => {
                pump.stop();
                if let Err(e) = lifecycle.destroy() {
                    tracing::error!(target: "lifecycle", "Teardown failed: {}", e);
                }
                tracing::debug!(target: "lifecycle", "Host surface {:?} released", surface.raw().id());
            }
            _ => {}
        });

        result.map_err(|e| HostError::EventLoop(format!("Event loop error: {}", e)))
    }

    fn handle_window_event(
        event: &WindowEvent,
        lifecycle: &mut Lifecycle,
        elwt: &EventLoopWindowTarget<()>,
    ) {
        match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(size) => {
                let bounds = Bounds::from_size(f64::from(size.width), f64::from(size.height));
                if let Err(e) = lifecycle.on_host_bounds_changed(bounds) {
                    tracing::warn!(target: "embedding", "Resize forwarding failed: {}", e);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::F5),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let start = !lifecycle.play_state().is_running();
                if let Err(e) = lifecycle.request_play(start) {
                    tracing::warn!(target: "play", "Play request failed: {}", e);
                }
            }
            _ => {}
        }
    }
}
