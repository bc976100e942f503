//! TOML-based application configuration.
//!
//! Stores deployment settings:
//! - Backend base URL and API key
//! - SMS gateway endpoint
//! - Dispatch quiet window
//! - Slot granularity and the cancelled-occupancy policy
//!
//! Configuration is stored at `~/.config/salonbook/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::booking::conflict::ConflictPolicy;
use crate::error::ConfigError;
use crate::model::hhmm;
use crate::scheduler::policy::QuietWindow;

/// Backend (system of record) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

/// SMS gateway settings for hosts without a device SMS channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

/// Reminder dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// No dispatch happens inside the quiet window.
    #[serde(default = "default_quiet_start")]
    pub quiet_start: String,
    #[serde(default = "default_quiet_end")]
    pub quiet_end: String,
}

/// Availability/booking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default = "default_slot_step")]
    pub slot_step_minutes: u32,
    /// Legacy-compatible default: cancelled appointments still block
    /// their slot.
    #[serde(default = "default_true")]
    pub count_cancelled_as_occupying: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/salonbook/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".into()
}
fn default_quiet_start() -> String {
    "20:00".into()
}
fn default_quiet_end() -> String {
    "09:00".into()
}
fn default_slot_step() -> u32 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            quiet_start: default_quiet_start(),
            quiet_end: default_quiet_end(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_step_minutes: default_slot_step(),
            count_cancelled_as_occupying: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            gateway: GatewayConfig::default(),
            sync: SyncConfig::default(),
            booking: BookingConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/salonbook"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// The configured quiet window, parsed.
    pub fn quiet_window(&self) -> Result<QuietWindow, ConfigError> {
        let parse = |field: &str, raw: &str| {
            hhmm::parse(raw).map_err(|message| ConfigError::InvalidValue {
                key: format!("sync.{field}"),
                message,
            })
        };
        Ok(QuietWindow::new(
            parse("quiet_start", &self.sync.quiet_start)?,
            parse("quiet_end", &self.sync.quiet_end)?,
        ))
    }

    /// The occupancy policy shared by availability and conflict checks.
    pub fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy {
            count_cancelled_as_occupying: self.booking.count_cancelled_as_occupying,
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some(split) => split,
            None => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        let mut current = &mut json;
        for part in parent_path.split('.') {
            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }
        let object = current
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = object
            .get(leaf)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value.parse::<u64>().map(Into::into).map_err(|e| {
                    ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: e.to_string(),
                    }
                })?,
            ),
            _ => serde_json::Value::String(value.to_string()),
        };
        object.insert(leaf.to_string(), new_value);

        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.sync.quiet_start, "20:00");
        assert_eq!(parsed.booking.slot_step_minutes, 30);
        assert!(parsed.booking.count_cancelled_as_occupying);
    }

    #[test]
    fn quiet_window_parses_hhmm() {
        let cfg = Config::default();
        let window = cfg.quiet_window().unwrap();
        assert!(window.contains(NaiveTime::from_hms_opt(21, 30, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn quiet_window_rejects_garbage() {
        let mut cfg = Config::default();
        cfg.sync.quiet_start = "late".into();
        assert!(matches!(
            cfg.quiet_window(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("sync.quiet_start").as_deref(), Some("20:00"));
        assert_eq!(cfg.get("booking.slot_step_minutes").as_deref(), Some("30"));
        assert!(cfg.get("booking.missing").is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[backend]\nbase_url = \"https://x/api\"\n").unwrap();
        assert_eq!(parsed.backend.base_url, "https://x/api");
        assert_eq!(parsed.sync.quiet_end, "09:00");
    }
}
