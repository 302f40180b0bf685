//! 生命周期端到端场景
//!
//! 使用脚本化的原生模块与窗口系统驱动完整的创建、嵌入、播放和拆除流程。

use pie_host::core::{ErrorKind, HostError, Operation};
use pie_host::diagnostics::Bitness;
use pie_host::embedding::{EmbeddingState, RejectReason};
use pie_host::lifecycle::{Lifecycle, LifecycleState};
use pie_host::native::NativeWindowHandle;
use pie_host::platform::{Bounds, WindowStyle};
use pie_host::play::{PlayState, TickPump};
use pie_host::testing::{write_module, DesktopCall, FakeDesktop, FakeSurface, GameCall, RecordingGame};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const HOST_PARENT: NativeWindowHandle = NativeWindowHandle::from_raw(0x5150);

struct Session {
    dir: TempDir,
    desktop: FakeDesktop,
    game: RecordingGame,
    lifecycle: Lifecycle,
}

fn session_with(bitness: Bitness) -> Session {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_module(dir.path(), "ApplicationDLL.dll", bitness).expect("module file");
    session_at(dir, path)
}

fn session_at(dir: TempDir, path: PathBuf) -> Session {
    let desktop = FakeDesktop::new();
    let game = RecordingGame::new();
    let lifecycle = Lifecycle::new(
        Box::new(desktop.loader(path)),
        Box::new(desktop.window_system()),
        Box::new(game.clone()),
    );
    Session {
        dir,
        desktop,
        game,
        lifecycle,
    }
}

fn session() -> Session {
    session_with(Bitness::current())
}

#[test]
fn test_architecture_mismatch_never_invokes_factory() {
    let mut s = session_with(Bitness::current().opposite());

    match s.lifecycle.create() {
        Err(HostError::ArchitectureMismatch { process, module }) => {
            assert_eq!(process, Bitness::current());
            assert_eq!(module, Bitness::current().opposite());
        }
        other => panic!("expected architecture mismatch, got {:?}", other),
    }

    assert!(s.lifecycle.handle().is_null());
    assert_eq!(s.desktop.count(&DesktopCall::Create), 0);
    assert_eq!(s.desktop.loads(), 0);
    assert!(!s.lifecycle.is_module_loaded());
}

#[test]
fn test_missing_module_is_reported_and_retryable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ApplicationDLL.dll");
    let mut s = session_at(dir, path.clone());

    let err = s.lifecycle.create().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModuleMissing);
    let outcome = s.lifecycle.status().latest_for(Operation::Create).unwrap();
    assert!(!outcome.ok);

    // 修复条件后重试成功
    write_module(s.dir.path(), "ApplicationDLL.dll", Bitness::current()).unwrap();
    assert!(!s.lifecycle.create().unwrap().is_null());
    assert!(s.lifecycle.status().latest_for(Operation::Create).unwrap().ok);
    s.lifecycle.destroy().unwrap();
}

#[test]
fn test_load_failure_stops_before_native_calls() {
    let mut s = session();
    s.desktop.fail_load(Some(126));

    match s.lifecycle.create() {
        Err(HostError::ModuleLoadFailure { code, .. }) => assert_eq!(code, Some(126)),
        other => panic!("expected load failure, got {:?}", other),
    }
    assert_eq!(s.desktop.loads(), 0);
    assert!(s.desktop.calls().is_empty());
}

#[test]
fn test_destroy_twice_destroys_once() {
    let mut s = session();
    s.lifecycle.create().unwrap();

    s.lifecycle.destroy().unwrap();
    s.lifecycle.destroy().unwrap();

    assert_eq!(s.desktop.count(&DesktopCall::Destroy), 1);
    assert_eq!(s.lifecycle.state(), LifecycleState::Destroyed);
    assert!(s.lifecycle.handle().is_null());
}

#[test]
fn test_embedded_destroy_runs_in_order() {
    let mut s = session();
    let handle = s.lifecycle.create().unwrap();
    s.lifecycle.embed(&FakeSurface::new(HOST_PARENT)).unwrap();
    s.desktop.set_running(true);
    s.lifecycle.tick().unwrap();
    assert_eq!(s.lifecycle.play_state(), PlayState::Running);
    s.desktop.clear_calls();

    s.lifecycle.destroy().unwrap();

    let calls = s.desktop.calls();
    let cleared = calls
        .iter()
        .position(|c| *c == DesktopCall::SetTickCallback(false))
        .expect("callback cleared");
    let destroyed = calls
        .iter()
        .position(|c| *c == DesktopCall::Destroy)
        .expect("native destroy");
    assert!(cleared < destroyed);
    assert_eq!(s.desktop.count(&DesktopCall::Destroy), 1);

    // 强制停止先于拆除完成，开始/停止成对
    assert_eq!(s.game.calls(), vec![GameCall::Start, GameCall::Stop]);
    assert_eq!(s.lifecycle.play_state(), PlayState::Stopped);
    assert_eq!(s.lifecycle.embedding_state(), EmbeddingState::Unembedded);
    assert!(s.desktop.style_of(handle).is_none());
}

#[test]
fn test_detach_before_destroy_is_optional() {
    let s = session();
    let desktop = s.desktop.clone();
    let _dir = s.dir;
    let mut lifecycle = s.lifecycle.with_detach_before_destroy(true);

    let handle = lifecycle.create().unwrap();
    lifecycle.embed(&FakeSurface::new(HOST_PARENT)).unwrap();
    desktop.clear_calls();
    lifecycle.destroy().unwrap();

    assert_eq!(
        desktop.calls(),
        vec![
            DesktopCall::SetTickCallback(false),
            DesktopCall::SetParent {
                child: handle,
                parent: NativeWindowHandle::NULL
            },
            DesktopCall::Destroy,
        ]
    );
}

#[test]
fn test_cross_process_window_is_never_adopted() {
    let mut s = session();
    let foreign_pid = s.desktop.current_pid() + 7;
    s.desktop.create_windows_owned_by(Some(foreign_pid));
    let handle = s.lifecycle.create().unwrap();
    s.desktop.clear_calls();

    match s.lifecycle.embed(&FakeSurface::new(HOST_PARENT)) {
        Err(HostError::EmbeddingRejected(RejectReason::CrossProcess { owner_pid, current_pid })) => {
            assert_eq!(owner_pid, foreign_pid);
            assert_eq!(current_pid, s.desktop.current_pid());
        }
        other => panic!("expected cross-process rejection, got {:?}", other),
    }

    assert!(!s.desktop.calls().iter().any(|c| matches!(
        c,
        DesktopCall::SetParent { .. } | DesktopCall::SetStyle { .. } | DesktopCall::Show
    )));
    assert_eq!(s.desktop.parent_of(handle), Some(NativeWindowHandle::NULL));
    assert_eq!(s.lifecycle.embedding_state(), EmbeddingState::Unembedded);
    s.lifecycle.destroy().unwrap();
}

#[test]
fn test_embed_normalizes_style_and_forwards_every_layout() {
    let mut s = session();
    let handle = s.lifecycle.create().unwrap();
    s.lifecycle.embed(&FakeSurface::new(HOST_PARENT)).unwrap();

    assert_eq!(s.desktop.parent_of(handle), Some(HOST_PARENT));
    assert_eq!(s.desktop.style_of(handle), Some(WindowStyle::EMBEDDED));
    assert!(s.desktop.is_visible(handle));

    let layouts = [
        Bounds::new(0.0, 0.0, 600.0, 500.0),
        Bounds::new(0.0, 0.0, 800.0, 600.0),
        Bounds::new(0.0, 0.0, 800.0, 600.0),
    ];
    for bounds in layouts {
        s.lifecycle.on_host_bounds_changed(bounds).unwrap();
    }
    assert_eq!(s.desktop.moves_of(handle), layouts.to_vec());
    s.lifecycle.destroy().unwrap();
}

#[test]
fn test_sampled_flag_drives_start_and_stop_edges() {
    let mut s = session();
    s.lifecycle.create().unwrap();

    for running in [false, false, true, true, false] {
        s.desktop.set_running(running);
        s.lifecycle.tick().unwrap();
    }

    assert_eq!(s.game.starts(), 1);
    assert_eq!(s.game.stops(), 1);
    let status = s.lifecycle.status();
    assert!(status.latest_for(Operation::PlayStart).is_some());
    assert!(status.latest_for(Operation::PlayStop).is_some());
    s.lifecycle.destroy().unwrap();
}

#[test]
fn test_native_fault_is_reported_and_retryable() {
    let mut s = session();
    s.lifecycle.create().unwrap();

    s.desktop.fault_on_pump(true);
    let err = s.lifecycle.tick().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedNativeFault);
    assert_eq!(
        s.lifecycle.status().latest().map(|o| o.operation),
        Some(Operation::Tick)
    );

    s.desktop.fault_on_pump(false);
    s.lifecycle.tick().unwrap();
    s.lifecycle.destroy().unwrap();
}

#[test]
fn test_recreate_after_destroy_reuses_binding() {
    let mut s = session();
    let first = s.lifecycle.create().unwrap();
    s.lifecycle.destroy().unwrap();

    let second = s.lifecycle.create().unwrap();
    assert_ne!(first, second);
    assert_eq!(s.lifecycle.state(), LifecycleState::Created);
    assert_eq!(s.desktop.loads(), 1);
    assert!(s.desktop.registered_callback().is_some());
    s.lifecycle.destroy().unwrap();
}

#[test]
fn test_window_closed_outside_is_detected() {
    let mut s = session();
    let handle = s.lifecycle.create().unwrap();
    assert!(s.lifecycle.is_window_alive());

    s.desktop.close_window(handle);
    assert!(!s.lifecycle.is_window_alive());
    s.lifecycle.destroy().unwrap();
    assert!(s.lifecycle.handle().is_null());
}

#[test]
fn test_pump_drives_lifecycle_ticks() {
    let mut s = session();
    s.lifecycle.create().unwrap();
    s.desktop.set_running(true);

    let t0 = Instant::now();
    let interval = Duration::from_millis(16);
    let mut pump = TickPump::new(interval);
    pump.start(t0);

    assert!(!pump.run_due(t0, &mut s.lifecycle).unwrap());
    s.desktop.queue_ticks(&[0.016]);
    assert!(pump.run_due(t0 + interval, &mut s.lifecycle).unwrap());
    s.desktop.queue_ticks(&[0.016]);
    assert!(pump.run_due(t0 + interval * 2, &mut s.lifecycle).unwrap());

    // 第一个节拍的增量早于开始边沿，不会转发
    assert_eq!(s.game.ticks(), vec![0.016]);
    assert_eq!(s.desktop.count(&DesktopCall::Pump), 2);
    s.lifecycle.destroy().unwrap();
}
