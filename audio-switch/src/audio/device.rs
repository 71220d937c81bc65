//! Audio device data models.
//!
//! Defines the device snapshot shared by the directory, the toggle policy and
//! the tray presenter, the events pushed when the current input changes, and
//! the audio error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque numeric device identifier (a CoreAudio `AudioDeviceID` on macOS).
pub type DeviceId = u32;

/// Direction of an audio endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Input,
    Output,
}

impl DeviceKind {
    /// The `input` flag used by the directory command surface.
    pub fn is_input(self) -> bool {
        matches!(self, DeviceKind::Input)
    }

    pub fn from_input_flag(input: bool) -> Self {
        if input {
            DeviceKind::Input
        } else {
            DeviceKind::Output
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Input => write!(f, "input"),
            DeviceKind::Output => write!(f, "output"),
        }
    }
}

/// Snapshot of one audio endpoint as reported by the directory.
///
/// Snapshots are never mutated locally; every decision re-fetches state or
/// reacts to a pushed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Identifier, stable for the device's lifetime in this session
    pub id: DeviceId,

    /// Human-readable label
    pub name: String,

    /// Input or output endpoint
    #[serde(rename = "deviceType")]
    pub kind: DeviceKind,

    /// Whether this is the OS default for its kind
    pub is_current: bool,

    /// Mute state (meaningful for inputs)
    pub is_muted: bool,

    /// Stable hardware identifier, when the backend can supply one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl Device {
    /// Create a device snapshot that is neither current nor muted.
    pub fn new(id: DeviceId, name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            is_current: false,
            is_muted: false,
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn current(mut self) -> Self {
        self.is_current = true;
        self
    }

    pub fn muted(mut self) -> Self {
        self.is_muted = true;
        self
    }

    pub fn is_input(&self) -> bool {
        self.kind.is_input()
    }
}

/// Notifications pushed by the directory side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    /// The default input device changed (`input-device-changed`)
    InputDeviceChanged(Device),

    /// The mute state of the current input changed (`mute-changed`).
    /// Carries the new snapshot when the emitter already knows it.
    MuteChanged(Option<Device>),
}

impl DirectoryEvent {
    /// Wire name of the notification channel.
    pub fn channel(&self) -> &'static str {
        match self {
            DirectoryEvent::InputDeviceChanged(_) => "input-device-changed",
            DirectoryEvent::MuteChanged(_) => "mute-changed",
        }
    }

    /// Device payload, if the event carries one.
    pub fn payload(&self) -> Option<&Device> {
        match self {
            DirectoryEvent::InputDeviceChanged(device) => Some(device),
            DirectoryEvent::MuteChanged(device) => device.as_ref(),
        }
    }
}

/// Audio service error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: DeviceId },

    #[error("No default device available")]
    NoDefaultDevice,

    #[error("No audio device directory available on this platform")]
    Unsupported,

    #[error("{operation} failed with status {status}")]
    Backend { operation: &'static str, status: i32 },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_serializes_with_directory_field_names() {
        let device = Device::new(7, "PRO X 2 LIGHTSPEED", DeviceKind::Input).current();
        let json = serde_json::to_value(&device).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["deviceType"], "input");
        assert_eq!(json["isCurrent"], true);
        assert_eq!(json["isMuted"], false);
        assert!(json.get("uid").is_none());
    }

    #[test]
    fn test_device_deserializes_without_uid() {
        let device: Device = serde_json::from_str(
            r#"{"id":3,"name":"MacBook Pro-Lautsprecher","deviceType":"output","isCurrent":false,"isMuted":false}"#,
        )
        .unwrap();

        assert_eq!(device.kind, DeviceKind::Output);
        assert_eq!(device.uid, None);
    }

    #[test]
    fn test_event_channels_and_payloads() {
        let device = Device::new(1, "Mic", DeviceKind::Input);
        let changed = DirectoryEvent::InputDeviceChanged(device.clone());
        assert_eq!(changed.channel(), "input-device-changed");
        assert_eq!(changed.payload(), Some(&device));

        let muted = DirectoryEvent::MuteChanged(None);
        assert_eq!(muted.channel(), "mute-changed");
        assert_eq!(muted.payload(), None);
    }
}
