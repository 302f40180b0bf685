//! 节拍回调注册
//!
//! 原生模块只接受不带上下文的 C 函数指针，因此回调通过线程局部的收件箱
//! 转交给注册对象。收件箱只保存弱引用，注册对象是唯一所有者；
//! 注册对象被清除后，迟到的回调会被丢弃。

use super::{NativeModule, TickCallback};
use crate::core::error::{HostError, HostResult};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

type Inbox = RefCell<VecDeque<f32>>;

thread_local! {
    static ACTIVE_INBOX: RefCell<Option<Weak<Inbox>>> = const { RefCell::new(None) };
}

extern "C" fn on_native_tick(delta_seconds: f32) {
    let delivered = ACTIVE_INBOX.with(|slot| {
        match slot.borrow().as_ref().and_then(Weak::upgrade) {
            Some(inbox) => {
                inbox.borrow_mut().push_back(delta_seconds);
                true
            }
            None => false,
        }
    });
    if !delivered {
        tracing::trace!(target: "lifecycle", "Dropped tick delivered without a registration");
    }
}

/// 节拍回调注册
///
/// 线程局部槽位负责把回调路由到当前注册，同一线程同时最多存在一个注册。
/// 每个生命周期只持有一个注册，由 [`crate::lifecycle::Lifecycle`] 在注册前检查。
pub struct TickCallbackRegistration {
    inbox: Rc<Inbox>,
}

impl TickCallbackRegistration {
    /// 向原生模块注册回调
    pub fn register(module: &mut dyn NativeModule) -> HostResult<Self> {
        let inbox = Rc::new(RefCell::new(VecDeque::new()));
        ACTIVE_INBOX.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.as_ref().and_then(Weak::upgrade).is_some() {
                return Err(HostError::CallbackAlreadyRegistered);
            }
            *slot = Some(Rc::downgrade(&inbox));
            Ok(())
        })?;

        let registration = Self { inbox };
        super::guarded("SetPieTickCallback", || {
            module.set_tick_callback(Some(on_native_tick as TickCallback))
        })?;
        tracing::debug!(target: "lifecycle", "Tick callback registered");
        Ok(registration)
    }

    /// 取出所有待处理的节拍增量
    pub fn drain(&self) -> Vec<f32> {
        self.inbox.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.inbox.borrow().len()
    }

    /// 从原生模块清除回调并结束注册
    pub fn clear(self, module: &mut dyn NativeModule) -> HostResult<()> {
        let result = super::guarded("SetPieTickCallback", || module.set_tick_callback(None));
        tracing::debug!(target: "lifecycle", "Tick callback cleared");
        result
    }
}

impl Drop for TickCallbackRegistration {
    fn drop(&mut self) {
        let inbox = Rc::downgrade(&self.inbox);
        ACTIVE_INBOX.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.as_ref().is_some_and(|active| active.ptr_eq(&inbox)) {
                *slot = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDesktop;

    #[test]
    fn test_ticks_reach_registration() {
        let desktop = FakeDesktop::new();
        let mut module = desktop.module();
        let registration = TickCallbackRegistration::register(&mut module).unwrap();

        let callback = desktop.registered_callback().expect("callback registered");
        callback(0.016);
        callback(0.017);

        assert_eq!(registration.pending(), 2);
        assert_eq!(registration.drain(), vec![0.016, 0.017]);
        assert_eq!(registration.pending(), 0);

        registration.clear(&mut module).unwrap();
        assert!(desktop.registered_callback().is_none());
    }

    #[test]
    fn test_second_registration_is_rejected() {
        let desktop = FakeDesktop::new();
        let mut module = desktop.module();
        let first = TickCallbackRegistration::register(&mut module).unwrap();

        let second = TickCallbackRegistration::register(&mut module);
        assert!(matches!(second, Err(HostError::CallbackAlreadyRegistered)));

        first.clear(&mut module).unwrap();
        let third = TickCallbackRegistration::register(&mut module).unwrap();
        third.clear(&mut module).unwrap();
    }

    #[test]
    fn test_late_tick_after_clear_is_dropped() {
        let desktop = FakeDesktop::new();
        let mut module = desktop.module();
        let registration = TickCallbackRegistration::register(&mut module).unwrap();
        let callback = desktop.registered_callback().unwrap();
        registration.clear(&mut module).unwrap();

        callback(0.5);

        let fresh = TickCallbackRegistration::register(&mut module).unwrap();
        assert_eq!(fresh.pending(), 0);
        fresh.clear(&mut module).unwrap();
    }
}
