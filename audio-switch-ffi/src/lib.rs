//! FFI bindings for Audio Switch.
//!
//! This crate exposes the JSON command bridge through a C ABI so foreign
//! hosts can drive the device directory and the toggle policy.
//! All functions use panic::catch_unwind to prevent Rust panics from
//! unwinding across the FFI boundary.

use audio_switch::audio::{self, commands};
use audio_switch::{AudioError, Config, DeviceDirectory};
use serde::Deserialize;
use std::cell::RefCell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::panic;
use std::ptr;
use std::sync::Arc;

// ============================================================================
// Error Handling
// ============================================================================

/// Error codes returned by FFI functions.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidHandle = -1,
    InvalidArgument = -2,
    DeviceNotFound = -3,
    BackendError = -4,
    JsonError = -5,
    NoDefaultDevice = -6,
    Unsupported = -7,
    Panic = -99,
}

impl From<&AudioError> for ErrorCode {
    fn from(err: &AudioError) -> Self {
        match err {
            AudioError::DeviceNotFound { .. } => ErrorCode::DeviceNotFound,
            AudioError::NoDefaultDevice => ErrorCode::NoDefaultDevice,
            AudioError::Unsupported => ErrorCode::Unsupported,
            AudioError::Backend { .. } => ErrorCode::BackendError,
            AudioError::InvalidCommand(_) => ErrorCode::JsonError,
        }
    }
}

/// Thread-local storage for the last error.
thread_local! {
    static LAST_ERROR: RefCell<Option<(ErrorCode, String)>> = const { RefCell::new(None) };
}

fn set_last_error(code: ErrorCode, message: impl Into<String>) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some((code, message.into()));
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

// ============================================================================
// Engine
// ============================================================================

/// Configuration for engine creation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// `EnvFilter` directive; installs a subscriber when set.
    pub log_level: Option<String>,
    /// Overrides the config file when present.
    pub config: Option<Config>,
}

/// Opaque handle to the engine. Actually points to an Engine struct.
pub type AudioSwitchHandle = *mut c_void;

/// Internal engine state.
pub struct Engine {
    directory: Arc<dyn DeviceDirectory>,
    config: Config,
}

impl Engine {
    /// Engine over an explicit directory.
    pub fn with_directory(directory: Arc<dyn DeviceDirectory>, config: Config) -> Self {
        Self { directory, config }
    }

    fn from_config(engine_config: EngineConfig) -> Result<Self, (ErrorCode, String)> {
        if let Some(level) = &engine_config.log_level {
            init_logging(level);
        }

        let config = match engine_config.config {
            Some(config) => config,
            None => Config::load().map_err(|e| (ErrorCode::InvalidArgument, e.to_string()))?,
        };
        config
            .validate()
            .map_err(|e| (ErrorCode::InvalidArgument, e.to_string()))?;

        let directory = audio::system_directory().map_err(|e| (ErrorCode::from(&e), e.to_string()))?;
        Ok(Self::with_directory(directory, config))
    }

    /// Run one JSON command and return the JSON result.
    pub fn invoke(&self, command_json: &str) -> Result<String, AudioError> {
        commands::execute_json(self.directory.as_ref(), &self.config, command_json)
    }

    /// Move the engine behind a handle for foreign callers.
    pub fn into_handle(self) -> AudioSwitchHandle {
        Box::into_raw(Box::new(self)) as AudioSwitchHandle
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(true)
        .compact()
        .try_init();
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Allocate a C string from a Rust string. Caller must free with audio_switch_free_string.
fn alloc_c_string(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        // Interior null byte, replace with empty
        Err(_) => CString::default().into_raw(),
    }
}

/// Parse a C string to a Rust string slice.
unsafe fn parse_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

// ============================================================================
// FFI Functions - Lifecycle
// ============================================================================

/// Create a new engine instance.
///
/// # Arguments
/// * `config_json` - JSON `EngineConfig` (can be null for defaults)
///
/// # Returns
/// Handle to the engine, or null on failure. Check audio_switch_last_error_code() on failure.
///
/// # Safety
/// The returned handle must be freed with audio_switch_destroy().
#[no_mangle]
pub extern "C" fn audio_switch_create(config_json: *const c_char) -> AudioSwitchHandle {
    clear_last_error();

    let result = panic::catch_unwind(|| {
        let engine_config = if config_json.is_null() {
            EngineConfig::default()
        } else {
            let Some(json_str) = (unsafe { parse_c_str(config_json) }) else {
                return Err((ErrorCode::InvalidArgument, "Config is not valid UTF-8".to_string()));
            };
            serde_json::from_str(json_str).map_err(|e| (ErrorCode::JsonError, e.to_string()))?
        };

        Engine::from_config(engine_config).map(Engine::into_handle)
    });

    match result {
        Ok(Ok(handle)) => handle,
        Ok(Err((code, message))) => {
            set_last_error(code, message);
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error(ErrorCode::Panic, "Panic during engine creation");
            ptr::null_mut()
        }
    }
}

/// Destroy an engine instance.
///
/// # Safety
/// The handle must have been created by audio_switch_create() and must not be used after this call.
#[no_mangle]
pub extern "C" fn audio_switch_destroy(handle: AudioSwitchHandle) {
    if handle.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| unsafe {
        let _ = Box::from_raw(handle as *mut Engine);
    });
}

// ============================================================================
// FFI Functions - Commands
// ============================================================================

/// Run one command against the engine.
///
/// # Arguments
/// * `handle` - Engine handle
/// * `command_json` - Command object, e.g. `{"cmd":"mute","deviceId":42,"mute":true}`
///
/// # Returns
/// JSON result string. Caller must free with audio_switch_free_string().
/// Returns null on failure.
#[no_mangle]
pub extern "C" fn audio_switch_invoke(
    handle: AudioSwitchHandle,
    command_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error(ErrorCode::InvalidHandle, "Null engine handle");
        return ptr::null_mut();
    }

    let result = panic::catch_unwind(|| {
        let Some(command) = (unsafe { parse_c_str(command_json) }) else {
            return Err((ErrorCode::InvalidArgument, "Invalid command string".to_string()));
        };

        let engine = unsafe { &*(handle as *const Engine) };
        engine
            .invoke(command)
            .map_err(|e| (ErrorCode::from(&e), e.to_string()))
    });

    match result {
        Ok(Ok(json)) => alloc_c_string(&json),
        Ok(Err((code, message))) => {
            tracing::debug!(?code, "Command failed: {}", message);
            set_last_error(code, message);
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error(ErrorCode::Panic, "Panic during command");
            ptr::null_mut()
        }
    }
}

// ============================================================================
// FFI Functions - Memory Management
// ============================================================================

/// Free a string allocated by this library.
///
/// # Safety
/// The pointer must have been returned by one of the audio_switch_* functions.
/// Do not call this on strings from other sources.
#[no_mangle]
pub extern "C" fn audio_switch_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| unsafe {
        let _ = CString::from_raw(ptr);
    });
}

// ============================================================================
// FFI Functions - Error Handling
// ============================================================================

/// Get the last error code.
///
/// # Returns
/// The error code from the last failed operation, or 0 if no error.
#[no_mangle]
pub extern "C" fn audio_switch_last_error_code() -> i32 {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(code, _)| *code as i32)
            .unwrap_or(ErrorCode::Success as i32)
    })
}

/// Get the last error message.
///
/// # Returns
/// Error message string. Caller must free with audio_switch_free_string().
/// Returns null if no error.
#[no_mangle]
pub extern "C" fn audio_switch_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(_, msg)| alloc_c_string(msg))
            .unwrap_or(ptr::null_mut())
    })
}

// ============================================================================
// FFI Functions - Utility
// ============================================================================

/// Get the library version.
///
/// # Returns
/// Version string. Caller must free with audio_switch_free_string().
#[no_mangle]
pub extern "C" fn audio_switch_version() -> *mut c_char {
    alloc_c_string(env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use audio_switch::{Device, DeviceKind, MemoryDirectory};
    use serde_json::Value;

    fn engine_handle() -> (AudioSwitchHandle, Arc<MemoryDirectory>) {
        let directory = Arc::new(MemoryDirectory::new(vec![
            Device::new(20, "MacBook Pro-Mikrofon", DeviceKind::Input).current(),
            Device::new(21, "MacBook Pro-Lautsprecher", DeviceKind::Output).current(),
            Device::new(10, "PRO X 2 LIGHTSPEED", DeviceKind::Input),
            Device::new(11, "PRO X 2 LIGHTSPEED", DeviceKind::Output),
        ]));
        let engine = Engine::with_directory(directory.clone(), Config::default());
        (engine.into_handle(), directory)
    }

    fn invoke(handle: AudioSwitchHandle, command: &str) -> Option<Value> {
        let command = CString::new(command).unwrap();
        let out = audio_switch_invoke(handle, command.as_ptr());
        if out.is_null() {
            return None;
        }
        let json = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        audio_switch_free_string(out);
        Some(serde_json::from_str(&json).unwrap())
    }

    fn last_error_message() -> String {
        let msg = audio_switch_last_error_message();
        assert!(!msg.is_null());
        let s = unsafe { CStr::from_ptr(msg) }.to_str().unwrap().to_string();
        audio_switch_free_string(msg);
        s
    }

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(
            ErrorCode::from(&AudioError::DeviceNotFound { device_id: 7 }),
            ErrorCode::DeviceNotFound
        );
        assert_eq!(
            ErrorCode::from(&AudioError::InvalidCommand("bad".to_string())),
            ErrorCode::JsonError
        );
    }

    #[test]
    fn test_invoke_toggle_switches_to_headset() {
        let (handle, directory) = engine_handle();

        let result = invoke(handle, r#"{"cmd":"toggle_audio_device"}"#).unwrap();
        assert_eq!(result["status"], "switched");
        assert_eq!(directory.commands().len(), 2);

        let current = invoke(handle, r#"{"cmd":"get_current_device","input":true}"#).unwrap();
        assert_eq!(current["id"], 10);

        audio_switch_destroy(handle);
    }

    #[test]
    fn test_invoke_unknown_device_sets_last_error() {
        let (handle, _directory) = engine_handle();

        let result = invoke(handle, r#"{"cmd":"mute","deviceId":99,"mute":true}"#);
        assert!(result.is_none());
        assert_eq!(audio_switch_last_error_code(), ErrorCode::DeviceNotFound as i32);
        assert!(last_error_message().contains("99"));

        // A successful call clears the error.
        invoke(handle, r#"{"cmd":"get_device_list"}"#).unwrap();
        assert_eq!(audio_switch_last_error_code(), 0);

        audio_switch_destroy(handle);
    }

    #[test]
    fn test_invoke_null_handle() {
        let command = CString::new(r#"{"cmd":"get_device_list"}"#).unwrap();
        let out = audio_switch_invoke(ptr::null_mut(), command.as_ptr());

        assert!(out.is_null());
        assert_eq!(audio_switch_last_error_code(), ErrorCode::InvalidHandle as i32);
    }

    #[test]
    fn test_invoke_malformed_command() {
        let (handle, _directory) = engine_handle();

        assert!(invoke(handle, "not json").is_none());
        assert_eq!(audio_switch_last_error_code(), ErrorCode::JsonError as i32);

        audio_switch_destroy(handle);
    }

    #[test]
    fn test_create_rejects_bad_config_json() {
        let config = CString::new("{").unwrap();
        let handle = audio_switch_create(config.as_ptr());

        assert!(handle.is_null());
        assert_eq!(audio_switch_last_error_code(), ErrorCode::JsonError as i32);
    }

    #[test]
    fn test_engine_config_accepts_inline_config() {
        let parsed: EngineConfig = serde_json::from_str(
            r#"{"logLevel":"audio_switch=debug","config":{"pollIntervalSecs":3}}"#,
        )
        .unwrap();

        assert_eq!(parsed.log_level.as_deref(), Some("audio_switch=debug"));
        assert_eq!(parsed.config.unwrap().poll_interval_secs, 3);
    }

    #[test]
    fn test_destroy_null_is_noop() {
        audio_switch_destroy(ptr::null_mut());
    }

    #[test]
    fn test_version() {
        let version = audio_switch_version();
        assert!(!version.is_null());
        unsafe {
            let s = CStr::from_ptr(version).to_str().unwrap();
            assert!(!s.is_empty());
        }
        audio_switch_free_string(version);
    }
}
