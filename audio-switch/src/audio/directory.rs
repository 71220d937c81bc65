//! The device directory seam.
//!
//! Everything that touches the OS audio subsystem goes through
//! [`DeviceDirectory`]. The policy and the presenter only ever see
//! [`Device`] snapshots.

use super::device::{AudioError, Device, DeviceId, DeviceKind};
use std::sync::{Mutex, MutexGuard};

/// Enumeration, query and mutation of audio endpoints.
pub trait DeviceDirectory: Send + Sync {
    /// All known endpoints, in OS enumeration order.
    fn device_list(&self) -> Result<Vec<Device>, AudioError>;

    /// The OS default device for `kind`, if any.
    fn current_device(&self, kind: DeviceKind) -> Result<Option<Device>, AudioError>;

    /// Make `device_id` the OS default for `kind`.
    fn set_current_device(&self, device_id: DeviceId, kind: DeviceKind) -> Result<(), AudioError>;

    /// Set the input mute state of `device_id` and return the resulting snapshot.
    fn mute(&self, device_id: DeviceId, mute: bool) -> Result<Device, AudioError>;
}

/// A mutating command recorded by [`MemoryDirectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryCommand {
    SetCurrentDevice { device_id: DeviceId, kind: DeviceKind },
    Mute { device_id: DeviceId, mute: bool },
}

#[derive(Debug, Default)]
struct MemoryState {
    devices: Vec<Device>,
    commands: Vec<DirectoryCommand>,
}

/// In-process directory backed by a plain device list.
///
/// Keeps at most one current device per kind and records every mutating
/// command in issue order.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<MemoryState>,
}

impl MemoryDirectory {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                devices,
                commands: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Plain data, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the device list, as if devices were plugged or unplugged.
    pub fn set_devices(&self, devices: Vec<Device>) {
        self.lock().devices = devices;
    }

    /// Snapshot of the current device list.
    pub fn devices(&self) -> Vec<Device> {
        self.lock().devices.clone()
    }

    /// Mutating commands issued so far.
    pub fn commands(&self) -> Vec<DirectoryCommand> {
        self.lock().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.lock().commands.clear();
    }
}

impl DeviceDirectory for MemoryDirectory {
    fn device_list(&self) -> Result<Vec<Device>, AudioError> {
        Ok(self.devices())
    }

    fn current_device(&self, kind: DeviceKind) -> Result<Option<Device>, AudioError> {
        Ok(self
            .lock()
            .devices
            .iter()
            .find(|d| d.kind == kind && d.is_current)
            .cloned())
    }

    fn set_current_device(&self, device_id: DeviceId, kind: DeviceKind) -> Result<(), AudioError> {
        let mut state = self.lock();
        state
            .commands
            .push(DirectoryCommand::SetCurrentDevice { device_id, kind });

        if !state
            .devices
            .iter()
            .any(|d| d.id == device_id && d.kind == kind)
        {
            return Err(AudioError::DeviceNotFound { device_id });
        }

        for device in state.devices.iter_mut().filter(|d| d.kind == kind) {
            device.is_current = device.id == device_id;
        }
        Ok(())
    }

    fn mute(&self, device_id: DeviceId, mute: bool) -> Result<Device, AudioError> {
        let mut state = self.lock();
        state.commands.push(DirectoryCommand::Mute { device_id, mute });

        let device = state
            .devices
            .iter_mut()
            .find(|d| d.id == device_id && d.is_input())
            .ok_or(AudioError::DeviceNotFound { device_id })?;
        device.is_muted = mute;
        Ok(device.clone())
    }
}
