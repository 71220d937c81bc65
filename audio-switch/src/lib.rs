//! Audio Switch - Library
//!
//! A menu-bar utility for flipping between a headset and the built-in
//! laptop microphone and speakers.
//!
//! ## Features
//!
//! - Toggle the input/output device pair between headset and laptop
//! - Toggle mute on the current input device
//! - Global shortcuts and a tray menu for both actions
//! - Tray icon and menu kept in sync with device changes
//! - JSON command bridge over the device directory

pub mod app;
pub mod audio;
pub mod logging;
pub mod platform;
pub mod ui;

pub use app::{Action, ActionLatch, AppState};
pub use audio::{
    AudioError, Command, Device, DeviceDirectory, DeviceKind, DeviceWatcher, DirectoryEvent,
    EventSink, MemoryDirectory, ToggleOutcome,
};
pub use platform::{Config, ConfigError, IconSet};
pub use ui::TrayView;
