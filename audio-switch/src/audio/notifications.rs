//! Device change notifications.
//!
//! The watcher polls the directory's current input device on a background
//! thread and pushes [`DirectoryEvent`]s to an [`EventSink`] whenever the
//! device or its mute state changes.

use super::device::{Device, DeviceId, DeviceKind, DirectoryEvent};
use super::directory::DeviceDirectory;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Receiver side of directory notifications.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DirectoryEvent);
}

impl EventSink for Sender<DirectoryEvent> {
    fn emit(&self, event: DirectoryEvent) {
        let _ = self.send(event);
    }
}

/// Remembers the last observed input and turns new observations into events.
#[derive(Debug, Default)]
pub struct InputTracker {
    last: Option<(DeviceId, bool)>,
    primed: bool,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `current` and return the event it implies, if any.
    ///
    /// The first observation only primes the tracker.
    pub fn observe(&mut self, current: Option<Device>) -> Option<DirectoryEvent> {
        let state = current.as_ref().map(|d| (d.id, d.is_muted));
        let previous = std::mem::replace(&mut self.last, state);

        if !std::mem::replace(&mut self.primed, true) {
            return None;
        }

        match (previous, current) {
            (Some((prev_id, _)), Some(device)) if prev_id != device.id => {
                Some(DirectoryEvent::InputDeviceChanged(device))
            }
            (None, Some(device)) => Some(DirectoryEvent::InputDeviceChanged(device)),
            (Some((_, prev_muted)), Some(device)) if prev_muted != device.is_muted => {
                Some(DirectoryEvent::MuteChanged(Some(device)))
            }
            // Losing the input entirely is left to the next real device.
            _ => None,
        }
    }
}

/// Background poller for the current input device.
///
/// Dropping the watcher stops the thread and waits for it to exit.
pub struct DeviceWatcher {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DeviceWatcher {
    /// Start polling every `interval`.
    pub fn spawn(
        directory: Arc<dyn DeviceDirectory>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = std::thread::Builder::new()
            .name("device-watcher".to_string())
            .spawn(move || {
                let mut tracker = InputTracker::new();
                loop {
                    match directory.current_device(DeviceKind::Input) {
                        Ok(current) => {
                            if let Some(event) = tracker.observe(current) {
                                tracing::debug!(channel = event.channel(), "Device change detected");
                                sink.emit(event);
                            }
                        }
                        Err(e) => tracing::warn!("Failed to poll current input device: {}", e),
                    }

                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                tracing::debug!("Device watcher stopped");
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

impl Drop for DeviceWatcher {
    fn drop(&mut self) {
        // Closing the channel wakes the thread immediately.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, MemoryDirectory};
    use std::sync::Mutex;

    fn mic(id: DeviceId) -> Device {
        Device::new(id, format!("Mic {id}"), DeviceKind::Input).current()
    }

    #[test]
    fn test_first_observation_only_primes() {
        let mut tracker = InputTracker::new();
        assert_eq!(tracker.observe(Some(mic(1))), None);
        assert_eq!(tracker.observe(Some(mic(1))), None);
    }

    #[test]
    fn test_device_change_emits_input_event() {
        let mut tracker = InputTracker::new();
        tracker.observe(Some(mic(1)));

        assert_eq!(
            tracker.observe(Some(mic(2))),
            Some(DirectoryEvent::InputDeviceChanged(mic(2)))
        );
    }

    #[test]
    fn test_mute_change_emits_mute_event() {
        let mut tracker = InputTracker::new();
        tracker.observe(Some(mic(1)));

        assert_eq!(
            tracker.observe(Some(mic(1).muted())),
            Some(DirectoryEvent::MuteChanged(Some(mic(1).muted())))
        );
    }

    #[test]
    fn test_device_reappearing_after_loss() {
        let mut tracker = InputTracker::new();
        tracker.observe(Some(mic(1)));

        assert_eq!(tracker.observe(None), None);
        assert_eq!(
            tracker.observe(Some(mic(1))),
            Some(DirectoryEvent::InputDeviceChanged(mic(1)))
        );
    }

    /// Directory that reports every poll of the current device.
    struct PollingDirectory {
        inner: MemoryDirectory,
        polled: Mutex<Sender<()>>,
    }

    impl DeviceDirectory for PollingDirectory {
        fn device_list(&self) -> Result<Vec<Device>, AudioError> {
            self.inner.device_list()
        }

        fn current_device(&self, kind: DeviceKind) -> Result<Option<Device>, AudioError> {
            let current = self.inner.current_device(kind);
            let _ = self.polled.lock().unwrap().send(());
            current
        }

        fn set_current_device(&self, device_id: DeviceId, kind: DeviceKind) -> Result<(), AudioError> {
            self.inner.set_current_device(device_id, kind)
        }

        fn mute(&self, device_id: DeviceId, mute: bool) -> Result<Device, AudioError> {
            self.inner.mute(device_id, mute)
        }
    }

    #[test]
    fn test_watcher_reports_switch() {
        let (polled_tx, polled_rx) = mpsc::channel();
        let dir = Arc::new(PollingDirectory {
            inner: MemoryDirectory::new(vec![mic(1), Device::new(2, "Mic 2", DeviceKind::Input)]),
            polled: Mutex::new(polled_tx),
        });
        let (tx, rx) = mpsc::channel();

        let watcher = DeviceWatcher::spawn(dir.clone(), Arc::new(tx), Duration::from_millis(10)).unwrap();
        // Switch only after the priming poll has read device 1.
        polled_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        dir.set_current_device(2, DeviceKind::Input).unwrap();

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        drop(watcher);

        match event {
            DirectoryEvent::InputDeviceChanged(device) => assert_eq!(device.id, 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
