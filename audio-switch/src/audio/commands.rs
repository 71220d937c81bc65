//! Named command bridge over the device directory.
//!
//! Commands arrive as JSON objects tagged with `cmd`, with camelCase
//! payloads, and produce JSON results. This is the surface foreign hosts
//! (see the FFI crate) use to drive the directory and the toggle policy.

use super::device::{AudioError, DeviceId, DeviceKind};
use super::directory::DeviceDirectory;
use super::policy;
use crate::platform::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A directory or policy command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    GetDeviceList,

    GetCurrentDevice {
        input: bool,
    },

    #[serde(rename_all = "camelCase")]
    SetCurrentDevice {
        device_id: DeviceId,
        input: bool,
    },

    #[serde(rename_all = "camelCase")]
    Mute {
        device_id: DeviceId,
        mute: bool,
    },

    ToggleAudioDevice,

    ToggleMute,
}

impl Command {
    pub fn parse(json: &str) -> Result<Self, AudioError> {
        serde_json::from_str(json).map_err(|e| AudioError::InvalidCommand(e.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::GetDeviceList => "get_device_list",
            Command::GetCurrentDevice { .. } => "get_current_device",
            Command::SetCurrentDevice { .. } => "set_current_device",
            Command::Mute { .. } => "mute",
            Command::ToggleAudioDevice => "toggle_audio_device",
            Command::ToggleMute => "toggle_mute",
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, AudioError> {
    serde_json::to_value(value).map_err(|e| AudioError::InvalidCommand(e.to_string()))
}

/// Run `command` against `directory`.
pub fn execute(
    directory: &dyn DeviceDirectory,
    config: &Config,
    command: &Command,
) -> Result<Value, AudioError> {
    tracing::debug!(command = command.name(), "Executing command");

    match *command {
        Command::GetDeviceList => to_value(directory.device_list()?),
        Command::GetCurrentDevice { input } => {
            to_value(directory.current_device(DeviceKind::from_input_flag(input))?)
        }
        Command::SetCurrentDevice { device_id, input } => {
            directory.set_current_device(device_id, DeviceKind::from_input_flag(input))?;
            Ok(Value::Null)
        }
        Command::Mute { device_id, mute } => to_value(directory.mute(device_id, mute)?),
        Command::ToggleAudioDevice => to_value(policy::toggle_device_pair(directory, config)?),
        Command::ToggleMute => to_value(policy::toggle_mute(directory)?),
    }
}

/// Parse and run a JSON command, returning the JSON result text.
pub fn execute_json(
    directory: &dyn DeviceDirectory,
    config: &Config,
    json: &str,
) -> Result<String, AudioError> {
    let command = Command::parse(json)?;
    let value = execute(directory, config, &command)?;
    serde_json::to_string(&value).map_err(|e| AudioError::InvalidCommand(e.to_string()))
}
