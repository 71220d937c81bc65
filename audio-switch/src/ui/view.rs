//! Tray view model.
//!
//! Everything the tray shows, derived from one input device snapshot.

use crate::audio::Device;
use crate::platform::{Config, MenuIconKind, TrayIconKind};

/// Rendered state of the tray icon and its dynamic menu entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayView {
    pub icon: TrayIconKind,
    pub tooltip: String,
    pub mute_label: String,
    pub mute_icon: MenuIconKind,
    pub current_device_label: String,
}

impl TrayView {
    /// View for the current input `device`, or the idle view when there is none.
    pub fn for_device(device: Option<&Device>, config: &Config) -> Self {
        let labels = &config.labels;
        let is_muted = device.is_some_and(|d| d.is_muted);
        let is_headset = device.is_some_and(|d| config.is_headset(d));
        let name = device.map_or(labels.no_device.as_str(), |d| d.name.as_str());

        // The mute entry offers the opposite of the current state.
        let (mute_label, mute_icon) = if is_muted {
            (labels.unmute.clone(), MenuIconKind::Mic)
        } else {
            (labels.mute.clone(), MenuIconKind::MicMuted)
        };

        Self {
            icon: TrayIconKind::select(is_muted, is_headset),
            tooltip: format!("{} ({})", labels.tooltip, name),
            mute_label,
            mute_icon,
            current_device_label: format!("{}: {}", labels.current_device, name),
        }
    }
}
