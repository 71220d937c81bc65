//! Global keyboard shortcuts.
//!
//! Registers the toggle-device and toggle-mute shortcuts and maps hotkey
//! presses back to application actions.

use crate::app::Action;
use crate::platform::Shortcuts;
use crate::ui::ActionBindings;
use global_hotkey::{
    hotkey::HotKey, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use thiserror::Error;

/// Hotkey registration error types.
#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("Invalid shortcut {shortcut:?}: {reason}")]
    InvalidShortcut { shortcut: String, reason: String },

    #[error("Failed to register shortcut {shortcut:?}: {source}")]
    RegisterFailed {
        shortcut: String,
        #[source]
        source: global_hotkey::Error,
    },

    #[error("Global hotkeys unavailable: {0}")]
    Unavailable(#[source] global_hotkey::Error),
}

fn parse(shortcut: &str) -> Result<HotKey, HotkeyError> {
    shortcut
        .parse::<HotKey>()
        .map_err(|e| HotkeyError::InvalidShortcut {
            shortcut: shortcut.to_string(),
            reason: e.to_string(),
        })
}

/// Registered shortcuts. Unregistered when dropped.
pub struct HotkeyBindings {
    manager: GlobalHotKeyManager,
    hotkeys: Vec<HotKey>,
    bindings: ActionBindings<u32>,
}

impl HotkeyBindings {
    /// Register both shortcuts with the OS.
    pub fn register(shortcuts: &Shortcuts) -> Result<Self, HotkeyError> {
        let manager = GlobalHotKeyManager::new().map_err(HotkeyError::Unavailable)?;
        let mut hotkeys = Vec::with_capacity(2);
        let mut bindings = ActionBindings::new();

        for (shortcut, action) in [
            (&shortcuts.toggle_device, Action::ToggleDevice),
            (&shortcuts.toggle_mute, Action::ToggleMute),
        ] {
            let hotkey = parse(shortcut)?;
            manager
                .register(hotkey)
                .map_err(|source| HotkeyError::RegisterFailed {
                    shortcut: shortcut.clone(),
                    source,
                })?;
            tracing::info!(shortcut = %shortcut, ?action, "Registered global shortcut");
            bindings.bind(hotkey.id(), action);
            hotkeys.push(hotkey);
        }

        Ok(Self {
            manager,
            hotkeys,
            bindings,
        })
    }

    /// The action for a hotkey event; only presses trigger actions.
    pub fn action_for(&self, event: &GlobalHotKeyEvent) -> Option<Action> {
        self.bindings
            .on_press(&event.id(), event.state() == HotKeyState::Pressed)
    }
}

impl Drop for HotkeyBindings {
    fn drop(&mut self) {
        for hotkey in self.hotkeys.drain(..) {
            let _ = self.manager.unregister(hotkey);
        }
    }
}
