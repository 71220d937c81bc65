//! UI module for the menu-bar presence.
//!
//! This module provides the tray view model and, on macOS, the tray icon
//! with its menu and the global shortcut bindings.

pub mod bindings;
#[cfg(target_os = "macos")]
pub mod hotkeys;
#[cfg(target_os = "macos")]
pub mod tray;
pub mod view;

#[cfg(target_os = "macos")]
pub use hotkeys::{HotkeyBindings, HotkeyError};
#[cfg(target_os = "macos")]
pub use tray::{TrayError, TrayManager};
pub use bindings::ActionBindings;
pub use view::TrayView;
