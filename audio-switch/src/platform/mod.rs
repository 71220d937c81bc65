//! Platform module for OS-facing utilities.
//!
//! This module contains the configuration file, icon generation and loading,
//! and the startup error alert.

pub mod alert;
pub mod config;
pub mod icons;

pub use config::{Config, ConfigError, DeviceMatcher, DevicePair, Labels, Shortcuts};
pub use icons::{IconError, IconImage, IconSet, MenuIconKind, TrayIconKind};
