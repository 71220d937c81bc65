//! Audio module: the device directory seam and the logic built on it.
//!
//! This module provides the device model, the directory trait with its
//! CoreAudio and in-memory implementations, the toggle policy, the command
//! bridge and the current-input watcher.

pub mod commands;
#[cfg(target_os = "macos")]
pub mod coreaudio;
pub mod device;
pub mod directory;
pub mod notifications;
pub mod policy;

pub use commands::Command;
#[cfg(target_os = "macos")]
pub use coreaudio::CoreAudioDirectory;
pub use device::{AudioError, Device, DeviceId, DeviceKind, DirectoryEvent};
pub use directory::{DeviceDirectory, DirectoryCommand, MemoryDirectory};
pub use notifications::{DeviceWatcher, EventSink, InputTracker};
pub use policy::{PairKind, ToggleOutcome};

use std::sync::Arc;

/// The OS device directory for the current platform.
pub fn system_directory() -> Result<Arc<dyn DeviceDirectory>, AudioError> {
    #[cfg(target_os = "macos")]
    {
        Ok(Arc::new(CoreAudioDirectory::new()))
    }

    #[cfg(not(target_os = "macos"))]
    {
        Err(AudioError::Unsupported)
    }
}
