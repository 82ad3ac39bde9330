//! Interface registry and per-frame fan-out

use crate::interfaces::{Interface, InterfaceError};
use crate::payload::FramePayload;
use log::{error, info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("interface '{0}' is already registered")]
    DuplicateId(String),
}

/// One or more interfaces failed while handling a frame
#[derive(Debug, Error)]
#[error("interface dispatch failed: {}", describe_failures(.failures))]
pub struct DispatchError {
    /// `(interface id, error)` in dispatch order
    pub failures: Vec<(String, InterfaceError)>,
}

fn describe_failures(failures: &[(String, InterfaceError)]) -> String {
    failures
        .iter()
        .map(|(id, err)| format!("[{}] {}", id, err))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Owns every constructed interface, in registration order, plus the active subset
#[derive(Default)]
pub struct InterfaceManager {
    interfaces: Vec<Box<dyn Interface>>,
    /// Parallel to `interfaces`
    active: Vec<bool>,
}

impl InterfaceManager {
    /// An empty manager; nothing is active until `set_active`/`activate_all`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, interface: Box<dyn Interface>) -> Result<(), ManagerError> {
        let id = interface.id();
        if self.position(id).is_some() {
            return Err(ManagerError::DuplicateId(id.to_string()));
        }
        self.interfaces.push(interface);
        self.active.push(false);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Registered ids in insertion order
    pub fn ids(&self) -> Vec<&'static str> {
        self.interfaces.iter().map(|i| i.id()).collect()
    }

    /// Active ids in insertion order
    pub fn active_ids(&self) -> Vec<&'static str> {
        self.interfaces
            .iter()
            .zip(&self.active)
            .filter(|(_, active)| **active)
            .map(|(i, _)| i.id())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&dyn Interface> {
        self.position(id).map(|i| self.interfaces[i].as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn Interface + 'static)> {
        let index = self.position(id)?;
        Some(self.interfaces[index].as_mut())
    }

    /// Replace the active set: listed interfaces are enabled, all others disabled.
    /// Unknown ids are ignored with a warning.
    pub fn set_active<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            let id = id.as_ref();
            if self.position(id).is_none() {
                warn!("[manager] Unknown interface '{}' ignored", id);
            }
        }

        for (interface, active) in self.interfaces.iter_mut().zip(self.active.iter_mut()) {
            *active = ids.iter().any(|id| id.as_ref() == interface.id());
            if *active {
                interface.enable();
            } else {
                interface.disable();
            }
        }
        info!("[manager] Active interfaces set to: {:?}", self.active_ids());
    }

    pub fn activate_all(&mut self) {
        for (interface, active) in self.interfaces.iter_mut().zip(self.active.iter_mut()) {
            interface.enable();
            *active = true;
        }
        info!("[manager] All interfaces active");
    }

    pub fn deactivate_all(&mut self) {
        for (interface, active) in self.interfaces.iter_mut().zip(self.active.iter_mut()) {
            interface.disable();
            *active = false;
        }
        info!("[manager] All interfaces inactive");
    }

    /// Forward one frame to every active, enabled interface in insertion order.
    ///
    /// A failing interface does not stop the others; all failures are
    /// returned together once the fan-out completes. Returns the number of
    /// interfaces that handled the frame successfully.
    #[hotpath::measure]
    pub fn on_frame(&mut self, payload: &FramePayload) -> Result<usize, DispatchError> {
        let mut handled = 0;
        let mut failures = Vec::new();

        for (interface, active) in self.interfaces.iter_mut().zip(&self.active) {
            if !*active || !interface.is_enabled() {
                continue;
            }
            match interface.on_frame(payload) {
                Ok(()) => handled += 1,
                Err(e) => {
                    error!("[{}] Frame handling failed: {}", interface.id(), e);
                    failures.push((interface.id().to_string(), e));
                }
            }
        }

        if failures.is_empty() {
            Ok(handled)
        } else {
            Err(DispatchError { failures })
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.interfaces.iter().position(|i| i.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterError;
    use crate::interfaces::InterfaceBase;
    use crate::payload::Handedness;
    use crate::test_support::{hand_with_pinch, payload};
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<&'static str>>>;

    /// Records every frame it receives; optionally fails
    struct Recorder {
        base: InterfaceBase,
        calls: CallLog,
        fail: bool,
    }

    impl Recorder {
        fn boxed(id: &'static str, calls: &CallLog, fail: bool) -> Box<dyn Interface> {
            Box::new(Self {
                base: InterfaceBase::new(id, "Recorder", Handedness::Right),
                calls: Rc::clone(calls),
                fail,
            })
        }
    }

    impl Interface for Recorder {
        fn base(&self) -> &InterfaceBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut InterfaceBase {
            &mut self.base
        }

        fn on_frame(&mut self, _payload: &FramePayload) -> Result<(), InterfaceError> {
            self.calls.borrow_mut().push(self.base.id());
            if self.fail {
                return Err(AdapterError::NotOpen("/dev/ttyUSB0".into()).into());
            }
            Ok(())
        }
    }

    fn manager_with(ids: &[&'static str], calls: &CallLog) -> InterfaceManager {
        let mut manager = InterfaceManager::new();
        for &id in ids {
            manager.register(Recorder::boxed(id, calls, false)).unwrap();
        }
        manager
    }

    fn frame() -> FramePayload {
        payload(vec![hand_with_pinch(Handedness::Right, 0.1)])
    }

    #[test]
    fn test_starts_inactive() {
        let calls = CallLog::default();
        let mut manager = manager_with(&["a", "b"], &calls);

        assert!(manager.active_ids().is_empty());
        assert_eq!(manager.on_frame(&frame()).unwrap(), 0);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let calls = CallLog::default();
        let mut manager = manager_with(&["a"], &calls);
        let err = manager.register(Recorder::boxed("a", &calls, false)).unwrap_err();
        assert!(matches!(err, ManagerError::DuplicateId(ref id) if id == "a"));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_dispatch_in_insertion_order() {
        let calls = CallLog::default();
        let mut manager = manager_with(&["c", "a", "b"], &calls);

        // order of the request does not matter
        manager.set_active(&["b", "c"]);
        manager.on_frame(&frame()).unwrap();

        assert_eq!(calls.borrow().as_slice(), &["c", "b"]);
        assert_eq!(manager.active_ids(), vec!["c", "b"]);
    }

    #[test]
    fn test_set_active_replaces() {
        let calls = CallLog::default();
        let mut manager = manager_with(&["a", "b", "c"], &calls);

        manager.set_active(&["a", "b"]);
        manager.set_active(&["c"]);

        assert_eq!(manager.active_ids(), vec!["c"]);
        assert!(!manager.get("a").unwrap().is_enabled());
        assert!(manager.get("c").unwrap().is_enabled());

        manager.on_frame(&frame()).unwrap();
        assert_eq!(calls.borrow().as_slice(), &["c"]);
    }

    #[test]
    fn test_unknown_ids_ignored() {
        let calls = CallLog::default();
        let mut manager = manager_with(&["a"], &calls);
        manager.set_active(&["a", "missing"]);
        assert_eq!(manager.active_ids(), vec!["a"]);
    }

    #[test]
    fn test_disabled_interface_skipped_while_active() {
        let calls = CallLog::default();
        let mut manager = manager_with(&["a", "b"], &calls);
        manager.activate_all();
        manager.get_mut("a").unwrap().disable();

        assert_eq!(manager.on_frame(&frame()).unwrap(), 1);
        assert_eq!(calls.borrow().as_slice(), &["b"]);
    }

    #[test]
    fn test_activate_and_deactivate_all() {
        let calls = CallLog::default();
        let mut manager = manager_with(&["a", "b"], &calls);

        manager.activate_all();
        assert_eq!(manager.active_ids(), vec!["a", "b"]);

        manager.deactivate_all();
        assert!(manager.active_ids().is_empty());
        assert_eq!(manager.on_frame(&frame()).unwrap(), 0);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_failure_isolated_and_reported() {
        let calls = CallLog::default();
        let mut manager = InterfaceManager::new();
        manager.register(Recorder::boxed("first", &calls, false)).unwrap();
        manager.register(Recorder::boxed("broken", &calls, true)).unwrap();
        manager.register(Recorder::boxed("last", &calls, false)).unwrap();
        manager.activate_all();

        let err = manager.on_frame(&frame()).unwrap_err();

        assert_eq!(calls.borrow().as_slice(), &["first", "broken", "last"]);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].0, "broken");
        assert_eq!(
            err.to_string(),
            "interface dispatch failed: [broken] serial port '/dev/ttyUSB0' is not open"
        );
    }
}
