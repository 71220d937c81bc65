//! CoreAudio device directory for macOS.
//!
//! Enumerates devices through the `coreaudio-rs` helpers and reads or writes
//! the default-device and mute properties directly on the HAL objects.

use super::device::{AudioError, Device, DeviceId, DeviceKind};
use super::directory::DeviceDirectory;
use core_foundation::base::TCFType;
use core_foundation::string::{CFString, CFStringRef};
use coreaudio::audio_unit::{macos_helpers, Scope};
use objc2_core_audio::{
    kAudioDevicePropertyDeviceUID, kAudioDevicePropertyMute,
    kAudioHardwarePropertyDefaultInputDevice, kAudioHardwarePropertyDefaultOutputDevice,
    kAudioObjectPropertyElementMain, kAudioObjectPropertyScopeGlobal,
    kAudioObjectPropertyScopeInput, kAudioObjectPropertyScopeOutput, kAudioObjectSystemObject,
    AudioDeviceID, AudioObjectGetPropertyData, AudioObjectGetPropertyDataSize, AudioObjectID,
    AudioObjectPropertyAddress, AudioObjectSetPropertyData,
};
use std::mem;
use std::ptr::{null, NonNull};

fn check(status: i32, operation: &'static str) -> Result<(), AudioError> {
    if status == 0 {
        Ok(())
    } else {
        Err(AudioError::Backend { operation, status })
    }
}

fn scope_for(kind: DeviceKind) -> u32 {
    match kind {
        DeviceKind::Input => kAudioObjectPropertyScopeInput,
        DeviceKind::Output => kAudioObjectPropertyScopeOutput,
    }
}

fn default_device_selector(kind: DeviceKind) -> u32 {
    match kind {
        DeviceKind::Input => kAudioHardwarePropertyDefaultInputDevice,
        DeviceKind::Output => kAudioHardwarePropertyDefaultOutputDevice,
    }
}

/// Directory backed by the CoreAudio HAL.
#[derive(Debug, Default)]
pub struct CoreAudioDirectory;

impl CoreAudioDirectory {
    pub fn new() -> Self {
        Self
    }

    fn default_device_id(&self, kind: DeviceKind) -> Option<AudioDeviceID> {
        macos_helpers::get_default_device_id(kind.is_input())
    }

    fn snapshot(&self, device_id: AudioDeviceID, kind: DeviceKind) -> Device {
        let name = macos_helpers::get_device_name(device_id).unwrap_or_else(|_| "N/A".to_string());
        let is_current = self.default_device_id(kind) == Some(device_id);
        let is_muted = read_mute(device_id, kind).unwrap_or(false);

        Device {
            id: device_id,
            name,
            kind,
            is_current,
            is_muted,
            uid: read_uid(device_id),
        }
    }

    fn supports(&self, device_id: AudioDeviceID, kind: DeviceKind) -> bool {
        let scope = match kind {
            DeviceKind::Input => Scope::Input,
            DeviceKind::Output => Scope::Output,
        };
        macos_helpers::get_audio_device_supports_scope(device_id, scope).unwrap_or(false)
    }
}

impl DeviceDirectory for CoreAudioDirectory {
    fn device_list(&self) -> Result<Vec<Device>, AudioError> {
        let ids = macos_helpers::get_audio_device_ids().map_err(|e| {
            tracing::error!("Failed to enumerate audio devices: {:?}", e);
            AudioError::Backend {
                operation: "AudioObjectGetPropertyData(devices)",
                status: -1,
            }
        })?;

        let mut devices = Vec::with_capacity(ids.len());
        for id in ids {
            // Devices with both scopes are listed once per kind.
            for kind in [DeviceKind::Input, DeviceKind::Output] {
                if self.supports(id, kind) {
                    devices.push(self.snapshot(id, kind));
                }
            }
        }
        Ok(devices)
    }

    fn current_device(&self, kind: DeviceKind) -> Result<Option<Device>, AudioError> {
        Ok(self.default_device_id(kind).map(|id| self.snapshot(id, kind)))
    }

    fn set_current_device(&self, device_id: DeviceId, kind: DeviceKind) -> Result<(), AudioError> {
        let address = AudioObjectPropertyAddress {
            mSelector: default_device_selector(kind),
            mScope: kAudioObjectPropertyScopeGlobal,
            mElement: kAudioObjectPropertyElementMain,
        };

        let data_size = mem::size_of::<AudioDeviceID>() as u32;
        let status = unsafe {
            AudioObjectSetPropertyData(
                kAudioObjectSystemObject as AudioObjectID,
                NonNull::from(&address),
                0,
                null(),
                data_size,
                NonNull::from(&device_id).cast(),
            )
        };
        check(status, "set default device")?;
        tracing::debug!(device_id, %kind, "Default device set");
        Ok(())
    }

    fn mute(&self, device_id: DeviceId, mute: bool) -> Result<Device, AudioError> {
        let address = AudioObjectPropertyAddress {
            mSelector: kAudioDevicePropertyMute,
            mScope: kAudioObjectPropertyScopeInput,
            mElement: kAudioObjectPropertyElementMain,
        };

        let value: u32 = u32::from(mute);
        let data_size = mem::size_of::<u32>() as u32;
        let status = unsafe {
            AudioObjectSetPropertyData(
                device_id as AudioObjectID,
                NonNull::from(&address),
                0,
                null(),
                data_size,
                NonNull::from(&value).cast(),
            )
        };
        check(status, "set mute")?;

        Ok(self.snapshot(device_id, DeviceKind::Input))
    }
}

fn read_mute(device_id: AudioDeviceID, kind: DeviceKind) -> Result<bool, AudioError> {
    let address = AudioObjectPropertyAddress {
        mSelector: kAudioDevicePropertyMute,
        mScope: scope_for(kind),
        mElement: kAudioObjectPropertyElementMain,
    };

    let mut data_size = 0u32;
    let status = unsafe {
        AudioObjectGetPropertyDataSize(
            device_id,
            NonNull::from(&address),
            0,
            null(),
            NonNull::from(&mut data_size),
        )
    };
    check(status, "get mute size")?;
    if data_size == 0 {
        return Err(AudioError::Backend {
            operation: "get mute size",
            status: 0,
        });
    }

    let mut muted: u32 = 0;
    let status = unsafe {
        AudioObjectGetPropertyData(
            device_id,
            NonNull::from(&address),
            0,
            null(),
            NonNull::from(&mut data_size),
            NonNull::from(&mut muted).cast(),
        )
    };
    check(status, "get mute")?;
    Ok(muted != 0)
}

fn read_uid(device_id: AudioDeviceID) -> Option<String> {
    let address = AudioObjectPropertyAddress {
        mSelector: kAudioDevicePropertyDeviceUID,
        mScope: kAudioObjectPropertyScopeGlobal,
        mElement: kAudioObjectPropertyElementMain,
    };

    let mut uid: CFStringRef = std::ptr::null();
    let mut data_size = mem::size_of::<CFStringRef>() as u32;
    let status = unsafe {
        AudioObjectGetPropertyData(
            device_id,
            NonNull::from(&address),
            0,
            null(),
            NonNull::from(&mut data_size),
            NonNull::from(&mut uid).cast(),
        )
    };
    if status != 0 || uid.is_null() {
        return None;
    }

    // The HAL hands out a retained string.
    let uid = unsafe { CFString::wrap_under_create_rule(uid) };
    Some(uid.to_string())
}
