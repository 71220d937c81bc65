//! User configuration.
//!
//! Read-only JSON file with the device pairs, shortcuts, menu labels and
//! watcher interval. Every field has a default, so a missing or partial file
//! still yields a complete [`Config`].

use crate::audio::Device;
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "AUDIO_SWITCH_CONFIG";

const CONFIG_FILE: &str = "config.json";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Identifies one configured device.
///
/// With a `uid` the device must carry exactly that hardware identifier and
/// the name is display-only. Without one, the name must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMatcher {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl DeviceMatcher {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: None,
        }
    }

    pub fn matches(&self, device: &Device) -> bool {
        match &self.uid {
            Some(uid) => device.uid.as_deref() == Some(uid.as_str()),
            None => device.name == self.name,
        }
    }
}

/// An input and output device switched together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePair {
    pub input: DeviceMatcher,
    pub output: DeviceMatcher,
}

/// A pair as written in the file; missing halves come from the default pair.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialPair {
    input: Option<DeviceMatcher>,
    output: Option<DeviceMatcher>,
}

impl PartialPair {
    fn over(self, base: DevicePair) -> DevicePair {
        DevicePair {
            input: self.input.unwrap_or(base.input),
            output: self.output.unwrap_or(base.output),
        }
    }
}

fn built_in_pair<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DevicePair, D::Error> {
    Ok(PartialPair::deserialize(deserializer)?.over(default_built_in()))
}

fn headset_pair<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DevicePair, D::Error> {
    Ok(PartialPair::deserialize(deserializer)?.over(default_headset()))
}

fn default_built_in() -> DevicePair {
    DevicePair {
        input: DeviceMatcher::named("MacBook Pro-Mikrofon"),
        output: DeviceMatcher::named("MacBook Pro-Lautsprecher"),
    }
}

fn default_headset() -> DevicePair {
    DevicePair {
        input: DeviceMatcher::named("PRO X 2 LIGHTSPEED"),
        output: DeviceMatcher::named("PRO X 2 LIGHTSPEED"),
    }
}

/// Global shortcut accelerators, in `CommandOrControl+Shift+N` notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Shortcuts {
    pub toggle_device: String,
    pub toggle_mute: String,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            toggle_device: "CommandOrControl+Shift+N".to_string(),
            toggle_mute: "CommandOrControl+Shift+M".to_string(),
        }
    }
}

/// Tray and menu texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    pub tooltip: String,
    pub toggle_device: String,
    pub mute: String,
    pub unmute: String,
    pub current_device: String,
    pub no_device: String,
    pub quit: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            tooltip: "Switch Audio".to_string(),
            toggle_device: "Audio-Gerät wechseln".to_string(),
            mute: "Stummschalten".to_string(),
            unmute: "Aktivieren".to_string(),
            current_device: "Aktuelles Gerät".to_string(),
            no_device: "...".to_string(),
            quit: "Beenden".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Laptop microphone and speakers
    #[serde(deserialize_with = "built_in_pair")]
    pub built_in: DevicePair,

    /// Headset microphone and speakers
    #[serde(deserialize_with = "headset_pair")]
    pub headset: DevicePair,

    pub shortcuts: Shortcuts,

    pub labels: Labels,

    /// How often the device watcher polls the current input
    pub poll_interval_secs: u64,

    /// Directory with PNG overrides for the generated icons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            built_in: default_built_in(),
            headset: default_headset(),
            shortcuts: Shortcuts::default(),
            labels: Labels::default(),
            poll_interval_secs: 10,
            icons_dir: None,
        }
    }
}

impl Config {
    /// Load from `$AUDIO_SWITCH_CONFIG` or the platform config directory.
    ///
    /// A missing file is not an error and yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Resolved config file location.
    pub fn path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("", "", "audio-switch").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "pollIntervalSecs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let pairs = [
            ("builtIn.input", &self.built_in.input),
            ("builtIn.output", &self.built_in.output),
            ("headset.input", &self.headset.input),
            ("headset.output", &self.headset.output),
        ];
        for (key, matcher) in pairs {
            if matcher.name.is_empty() && matcher.uid.is_none() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "needs a name or a uid".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Whether `device` is the configured headset microphone.
    pub fn is_headset(&self, device: &Device) -> bool {
        self.headset.input.matches(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DeviceKind;

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let config = Config::from_json_str(
            r#"{
                "headset": {
                    "input": { "name": "WH-1000XM4" },
                    "output": { "name": "WH-1000XM4" }
                },
                "labels": { "mute": "Mute" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.headset.input.name, "WH-1000XM4");
        assert_eq!(config.built_in, Config::default().built_in);
        assert_eq!(config.labels.mute, "Mute");
        assert_eq!(config.labels.unmute, "Aktivieren");
        assert_eq!(config.poll_interval_secs, 10);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = Config::from_json_str(r#"{ "pollIntervalSecs": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "pollIntervalSecs",
                ..
            }
        ));
    }

    #[test]
    fn test_matcher_without_name_or_uid_rejected() {
        let err = Config::from_json_str(
            r#"{ "builtIn": { "input": { "name": "" }, "output": { "name": "Speakers" } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "builtIn.input", .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            Config::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_uid_matcher_ignores_name() {
        let matcher = DeviceMatcher {
            name: "Headset".to_string(),
            uid: Some("AppleUSBAudioEngine:Logitech:PRO X 2".to_string()),
        };

        let renamed = Device::new(4, "Kopfhörer", DeviceKind::Input)
            .with_uid("AppleUSBAudioEngine:Logitech:PRO X 2");
        let same_name = Device::new(5, "Headset", DeviceKind::Input);

        assert!(matcher.matches(&renamed));
        assert!(!matcher.matches(&same_name));
    }

    #[test]
    fn test_is_headset_uses_input_matcher_only() {
        let mut config = Config::default();
        config.headset.output = DeviceMatcher::named("PRO X 2 Speakers");
        let mic = Device::new(8, "PRO X 2 LIGHTSPEED", DeviceKind::Input);
        let speakers = Device::new(9, "PRO X 2 Speakers", DeviceKind::Output);
        let laptop = Device::new(1, "MacBook Pro-Mikrofon", DeviceKind::Input);

        assert!(config.is_headset(&mic));
        assert!(!config.is_headset(&speakers));
        assert!(!config.is_headset(&laptop));
    }

    #[test]
    fn test_uid_only_matchers_parse() {
        let config = Config::from_json_str(
            r#"{"headset":{"input":{"uid":"usb:in"},"output":{"uid":"usb:out"}}}"#,
        )
        .unwrap();

        assert_eq!(config.headset.input.uid.as_deref(), Some("usb:in"));
        assert_eq!(config.headset.input.name, "");
        assert_eq!(config.headset.output.uid.as_deref(), Some("usb:out"));
        assert!(config.is_headset(&Device::new(3, "Anything", DeviceKind::Input).with_uid("usb:in")));
    }

    #[test]
    fn test_half_pair_merges_over_default_pair() {
        let config = Config::from_json_str(r#"{"headset":{"input":{"name":"WH-1000XM4"}}}"#).unwrap();

        assert_eq!(config.headset.input, DeviceMatcher::named("WH-1000XM4"));
        assert_eq!(config.headset.output, DeviceMatcher::named("PRO X 2 LIGHTSPEED"));
        assert_eq!(config.built_in, Config::default().built_in);
    }

    #[test]
    fn test_empty_matcher_rejected() {
        let err = Config::from_json_str(r#"{"builtIn":{"output":{}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "builtIn.output", .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::from_file(Path::new("/nonexistent/audio-switch/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
