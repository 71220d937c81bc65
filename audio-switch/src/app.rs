//! Application state and action dispatch.
//!
//! [`AppState`] owns the directory, the configuration and the event sink,
//! runs tray/shortcut actions on worker threads, and resolves directory
//! events into tray views.

use crate::audio::{
    policy, AudioError, Device, DeviceDirectory, DeviceKind, DirectoryEvent, EventSink,
    ToggleOutcome,
};
use crate::platform::Config;
use crate::ui::TrayView;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// User-triggered operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ToggleDevice,
    ToggleMute,
}

impl Action {
    fn thread_name(self) -> &'static str {
        match self {
            Action::ToggleDevice => "toggle-device",
            Action::ToggleMute => "toggle-mute",
        }
    }
}

/// Allows at most one in-flight run of an action.
#[derive(Debug, Default)]
pub struct ActionLatch {
    busy: AtomicBool,
}

/// Releases its latch when dropped.
#[derive(Debug)]
pub struct LatchGuard {
    latch: Arc<ActionLatch>,
}

impl ActionLatch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim the latch, or `None` if a run is already in flight.
    pub fn try_acquire(self: &Arc<Self>) -> Option<LatchGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LatchGuard {
                latch: Arc::clone(self),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.latch.busy.store(false, Ordering::Release);
    }
}

/// Main application state.
#[derive(Clone)]
pub struct AppState {
    directory: Arc<dyn DeviceDirectory>,
    config: Arc<Config>,
    sink: Arc<dyn EventSink>,
    toggle_latch: Arc<ActionLatch>,
    mute_latch: Arc<ActionLatch>,
}

impl AppState {
    pub fn new(directory: Arc<dyn DeviceDirectory>, config: Config, sink: Arc<dyn EventSink>) -> Self {
        Self {
            directory,
            config: Arc::new(config),
            sink,
            toggle_latch: ActionLatch::new(),
            mute_latch: ActionLatch::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn directory(&self) -> Arc<dyn DeviceDirectory> {
        Arc::clone(&self.directory)
    }

    fn latch(&self, action: Action) -> &Arc<ActionLatch> {
        match action {
            Action::ToggleDevice => &self.toggle_latch,
            Action::ToggleMute => &self.mute_latch,
        }
    }

    /// Run `action` on a worker thread.
    ///
    /// Returns `None` without doing anything if the same action is still in
    /// flight or the thread could not be started.
    pub fn dispatch(&self, action: Action) -> Option<JoinHandle<()>> {
        let Some(guard) = self.latch(action).try_acquire() else {
            tracing::debug!(?action, "Action already in flight, ignoring");
            return None;
        };

        let state = self.clone();
        let spawned = std::thread::Builder::new()
            .name(action.thread_name().to_string())
            .spawn(move || {
                let _guard = guard;
                match state.run(action) {
                    Ok(Some(event)) => state.sink.emit(event),
                    Ok(None) => {}
                    Err(e) => tracing::error!(?action, "Action failed: {}", e),
                }
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(?action, "Failed to start worker thread: {}", e);
                None
            }
        }
    }

    /// Run `action` on the calling thread and return the event it produced.
    pub fn run(&self, action: Action) -> Result<Option<DirectoryEvent>, AudioError> {
        match action {
            Action::ToggleDevice => {
                match policy::toggle_device_pair(self.directory.as_ref(), &self.config)? {
                    ToggleOutcome::Switched { input, .. } => {
                        Ok(Some(DirectoryEvent::InputDeviceChanged(input)))
                    }
                    ToggleOutcome::NoEligiblePair { .. } => Ok(None),
                }
            }
            Action::ToggleMute => {
                let device = policy::toggle_mute(self.directory.as_ref())?;
                Ok(Some(DirectoryEvent::MuteChanged(Some(device))))
            }
        }
    }

    /// The device to render for `event`: its payload, or a fresh query.
    pub fn resolve(&self, event: Option<&DirectoryEvent>) -> Result<Option<Device>, AudioError> {
        match event.and_then(DirectoryEvent::payload) {
            Some(device) => Ok(Some(device.clone())),
            None => self.directory.current_device(DeviceKind::Input),
        }
    }

    /// Tray view for `event`; query failures render the idle view.
    pub fn view(&self, event: Option<&DirectoryEvent>) -> TrayView {
        let device = self.resolve(event).unwrap_or_else(|e| {
            tracing::warn!("Failed to query current input device: {}", e);
            None
        });
        TrayView::for_device(device.as_ref(), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{DirectoryCommand, MemoryDirectory};
    use crate::platform::TrayIconKind;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Mutex;
    use std::time::Duration;

    fn devices() -> Vec<Device> {
        vec![
            Device::new(20, "MacBook Pro-Mikrofon", DeviceKind::Input).current(),
            Device::new(21, "MacBook Pro-Lautsprecher", DeviceKind::Output).current(),
            Device::new(10, "PRO X 2 LIGHTSPEED", DeviceKind::Input),
            Device::new(11, "PRO X 2 LIGHTSPEED", DeviceKind::Output),
        ]
    }

    fn state(dir: Arc<dyn DeviceDirectory>) -> (AppState, Receiver<DirectoryEvent>) {
        let (tx, rx) = mpsc::channel();
        (AppState::new(dir, Config::default(), Arc::new(tx)), rx)
    }

    /// Directory whose `device_list` blocks until released.
    struct GatedDirectory {
        inner: MemoryDirectory,
        gate: Mutex<Receiver<()>>,
    }

    impl DeviceDirectory for GatedDirectory {
        fn device_list(&self) -> Result<Vec<Device>, AudioError> {
            let _ = self.gate.lock().unwrap().recv();
            self.inner.device_list()
        }

        fn current_device(&self, kind: DeviceKind) -> Result<Option<Device>, AudioError> {
            self.inner.current_device(kind)
        }

        fn set_current_device(&self, device_id: u32, kind: DeviceKind) -> Result<(), AudioError> {
            self.inner.set_current_device(device_id, kind)
        }

        fn mute(&self, device_id: u32, mute: bool) -> Result<Device, AudioError> {
            self.inner.mute(device_id, mute)
        }
    }

    #[test]
    fn test_latch_is_exclusive_until_guard_drops() {
        let latch = ActionLatch::new();
        let guard = latch.try_acquire().unwrap();

        assert!(latch.is_busy());
        assert!(latch.try_acquire().is_none());

        drop(guard);
        assert!(!latch.is_busy());
        assert!(latch.try_acquire().is_some());
    }

    #[test]
    fn test_toggle_emits_input_changed() {
        let dir = Arc::new(MemoryDirectory::new(devices()));
        let (app, rx) = state(dir.clone());

        app.dispatch(Action::ToggleDevice).unwrap().join().unwrap();

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            DirectoryEvent::InputDeviceChanged(device) => assert_eq!(device.id, 10),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(dir.commands().len(), 2);
    }

    #[test]
    fn test_mute_emits_mute_changed_with_snapshot() {
        let dir = Arc::new(MemoryDirectory::new(devices()));
        let (app, rx) = state(dir);

        app.dispatch(Action::ToggleMute).unwrap().join().unwrap();

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            DirectoryEvent::MuteChanged(Some(device)) => {
                assert_eq!(device.id, 20);
                assert!(device.is_muted);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_no_eligible_pair_emits_nothing() {
        let dir = Arc::new(MemoryDirectory::new(vec![
            Device::new(20, "MacBook Pro-Mikrofon", DeviceKind::Input).current(),
        ]));
        let (app, rx) = state(dir);

        assert_eq!(app.run(Action::ToggleDevice).unwrap(), None);
        app.dispatch(Action::ToggleDevice).unwrap().join().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_action_releases_latch() {
        let dir = Arc::new(MemoryDirectory::new(vec![]));
        let (app, rx) = state(dir);

        app.dispatch(Action::ToggleMute).unwrap().join().unwrap();

        assert!(rx.try_recv().is_err());
        assert!(!app.mute_latch.is_busy());
        assert!(app.dispatch(Action::ToggleMute).is_some());
    }

    #[test]
    fn test_overlapping_toggle_is_dropped() {
        let (release, gate) = mpsc::channel();
        let dir = Arc::new(GatedDirectory {
            inner: MemoryDirectory::new(devices()),
            gate: Mutex::new(gate),
        });
        let (app, rx) = state(dir.clone());

        let first = app.dispatch(Action::ToggleDevice).unwrap();
        assert!(app.dispatch(Action::ToggleDevice).is_none());

        // A different action kind is not blocked.
        app.dispatch(Action::ToggleMute).unwrap().join().unwrap();

        release.send(()).unwrap();
        first.join().unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        let switches = dir
            .inner
            .commands()
            .into_iter()
            .filter(|c| matches!(c, DirectoryCommand::SetCurrentDevice { .. }))
            .count();
        assert_eq!(switches, 2);
    }

    #[test]
    fn test_resolve_prefers_payload_then_queries() {
        let dir = Arc::new(MemoryDirectory::new(devices()));
        let (app, _rx) = state(dir);
        let headset = Device::new(10, "PRO X 2 LIGHTSPEED", DeviceKind::Input);

        let from_payload = app
            .resolve(Some(&DirectoryEvent::InputDeviceChanged(headset.clone())))
            .unwrap();
        assert_eq!(from_payload, Some(headset));

        let queried = app.resolve(Some(&DirectoryEvent::MuteChanged(None))).unwrap();
        assert_eq!(queried.map(|d| d.id), Some(20));
    }

    #[test]
    fn test_initial_view_reflects_current_input() {
        let dir = Arc::new(MemoryDirectory::new(devices()));
        let (app, _rx) = state(dir);

        let view = app.view(None);
        assert_eq!(view.icon, TrayIconKind::Laptop);
        assert_eq!(view.current_device_label, "Aktuelles Gerät: MacBook Pro-Mikrofon");
    }
}
