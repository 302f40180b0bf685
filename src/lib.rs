//! # PIE Host
//!
//! 托管由外部原生模块创建的窗口：在调用原生工厂之前完成模块诊断，
//! 把窗口嵌入宿主表面，并让播放会话与原生侧的运行标志保持同步。
//!
//! ## 数据流
//!
//! 诊断与预检把关 [`lifecycle::Lifecycle::create`]；生命周期把句柄交给嵌入宿主；
//! 节拍泵驱动消息循环，并把采样到的运行标志交给播放会话控制器。
//!
//! ```ignore
//! use pie_host::lifecycle::Lifecycle;
//! use pie_host::native::LibraryLoader;
//! use pie_host::platform::default_window_system;
//! use pie_host::play::SampleGame;
//!
//! let mut lifecycle = Lifecycle::new(
//!     Box::new(LibraryLoader::new("ApplicationDLL.dll")),
//!     default_window_system(),
//!     Box::new(SampleGame::new()),
//! );
//! lifecycle.create()?;
//! lifecycle.embed(&surface)?;
//! ```
//!
//! ## Modules
//!
//! - [`core`]: 错误类型、状态面板和独立宿主入口
//! - [`config`]: 配置加载
//! - [`diagnostics`]: 模块可加载性与位宽检查
//! - [`native`]: 原生模块绑定与节拍回调
//! - [`platform`]: 窗口系统抽象
//! - [`embedding`]: 预检与嵌入
//! - [`lifecycle`]: 原生窗口生命周期
//! - [`play`]: 播放会话与节拍泵

/// Core types and the standalone host
pub mod core;
/// Configuration loading
pub mod config;
/// Module diagnostics run before any native call
pub mod diagnostics;
/// Native module binding
pub mod native;
/// Platform window system abstraction
pub mod platform;
/// Preflight validation and embedding
pub mod embedding;
/// Native window lifecycle
pub mod lifecycle;
/// Play session and tick pump
pub mod play;

#[doc(hidden)]
pub mod testing;
