//! Toggle policy.
//!
//! Decides which device pair becomes active on a toggle, and flips the mute
//! state of the current input. Selection is pure over the device list; the
//! directory is only used to fetch that list and to issue the resulting
//! commands.

use super::device::{AudioError, Device, DeviceKind};
use super::directory::DeviceDirectory;
use crate::platform::{Config, DeviceMatcher};
use serde::Serialize;

/// Which configured pair a toggle selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PairKind {
    BuiltIn,
    Headset,
}

/// A pair chosen by [`select_pair`], borrowed from the device list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub pair: PairKind,
    pub input: &'a Device,
    pub output: &'a Device,
}

/// Result of a device toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ToggleOutcome {
    /// The pair was activated. `input` is the snapshot from before activation,
    /// so its `is_current`/`is_muted` flags may already be stale.
    #[serde(rename_all = "camelCase")]
    Switched {
        pair: PairKind,
        input: Device,
        output: Device,
    },

    /// Neither pair is fully present; nothing was changed.
    #[serde(rename_all = "camelCase")]
    NoEligiblePair { current_input: Option<Device> },
}

impl ToggleOutcome {
    /// The device that is the active input after the toggle, if known.
    pub fn active_input(&self) -> Option<&Device> {
        match self {
            ToggleOutcome::Switched { input, .. } => Some(input),
            ToggleOutcome::NoEligiblePair { current_input } => current_input.as_ref(),
        }
    }
}

fn find<'a>(devices: &'a [Device], matcher: &DeviceMatcher, kind: DeviceKind) -> Option<&'a Device> {
    devices
        .iter()
        .find(|d| d.kind == kind && matcher.matches(d))
}

/// The device list's current input, if any.
pub fn current_input(devices: &[Device]) -> Option<&Device> {
    devices
        .iter()
        .find(|d| d.kind == DeviceKind::Input && d.is_current)
}

/// Pick the pair to activate next.
///
/// From the headset (when the built-in pair is complete) go to the built-in
/// pair; otherwise go to the headset if it is complete. First match in list
/// order wins for duplicate names.
pub fn select_pair<'a>(devices: &'a [Device], config: &Config) -> Option<Selection<'a>> {
    let current = current_input(devices);

    let built_in_input = find(devices, &config.built_in.input, DeviceKind::Input);
    let built_in_output = find(devices, &config.built_in.output, DeviceKind::Output);
    let headset_input = find(devices, &config.headset.input, DeviceKind::Input);
    let headset_output = find(devices, &config.headset.output, DeviceKind::Output);

    let on_headset = current.is_some_and(|d| config.headset.input.matches(d));

    if let (true, Some(input), Some(output)) = (on_headset, built_in_input, built_in_output) {
        return Some(Selection {
            pair: PairKind::BuiltIn,
            input,
            output,
        });
    }

    match (headset_input, headset_output) {
        (Some(input), Some(output)) => Some(Selection {
            pair: PairKind::Headset,
            input,
            output,
        }),
        _ => None,
    }
}

/// Switch between the headset and the built-in pair.
///
/// Sets the input device first, then the output device. The two calls are
/// not atomic; a failure on the second leaves the input already switched.
pub fn toggle_device_pair(
    directory: &dyn DeviceDirectory,
    config: &Config,
) -> Result<ToggleOutcome, AudioError> {
    let devices = directory.device_list()?;

    let Some(selection) = select_pair(&devices, config) else {
        let current_input = current_input(&devices).cloned();
        tracing::warn!(
            current = current_input.as_ref().map(|d| d.name.as_str()),
            "No eligible device pair to switch to"
        );
        return Ok(ToggleOutcome::NoEligiblePair { current_input });
    };

    tracing::info!(
        pair = ?selection.pair,
        input = %selection.input.name,
        output = %selection.output.name,
        "Switching device pair"
    );
    directory.set_current_device(selection.input.id, DeviceKind::Input)?;
    directory.set_current_device(selection.output.id, DeviceKind::Output)?;

    Ok(ToggleOutcome::Switched {
        pair: selection.pair,
        input: selection.input.clone(),
        output: selection.output.clone(),
    })
}

/// Flip the mute state of the current input device.
///
/// Returns the snapshot reported by the directory's `mute` response.
pub fn toggle_mute(directory: &dyn DeviceDirectory) -> Result<Device, AudioError> {
    let device = directory
        .current_device(DeviceKind::Input)?
        .ok_or(AudioError::NoDefaultDevice)?;

    let mute = !device.is_muted;
    tracing::info!(device = %device.name, mute, "Toggling mute");
    directory.mute(device.id, mute)
}
