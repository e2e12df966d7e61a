//! TOML-based configuration.
//!
//! Stores engine defaults:
//! - Scheduler settings (candidate count, spacing probability, bucket width)
//! - Optional overnight blackout window
//!
//! Configuration is stored at `~/.config/questplan/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::blackout::BlackoutWindow;
use crate::error::{ConfigError, Result};
use crate::priority::DEFAULT_BUCKET_MINUTES;
use crate::scheduler::SchedulerConfig;

/// Scheduler defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_num_schedules")]
    pub num_schedules: usize,
    #[serde(default)]
    pub skip_probability: f64,
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: i64,
    #[serde(default)]
    pub parallel: bool,
    /// Fixed seed for reproducible output (absent = random)
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Overnight blackout defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackoutSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_blackout_start")]
    pub start: String,
    #[serde(default = "default_blackout_end")]
    pub end: String,
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/questplan/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub blackout: BlackoutSection,
}

fn default_num_schedules() -> usize {
    3
}
fn default_bucket_minutes() -> i64 {
    DEFAULT_BUCKET_MINUTES
}
fn default_blackout_start() -> String {
    "23:00".into()
}
fn default_blackout_end() -> String {
    "07:00".into()
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            num_schedules: default_num_schedules(),
            skip_probability: 0.0,
            bucket_minutes: default_bucket_minutes(),
            parallel: false,
            seed: None,
        }
    }
}

impl Default for BlackoutSection {
    fn default() -> Self {
        Self {
            enabled: false,
            start: default_blackout_start(),
            end: default_blackout_end(),
            tz_offset_minutes: 0,
        }
    }
}

/// Returns the configuration directory.
///
/// `QUESTPLAN_CONFIG_DIR` wins outright; otherwise `~/.config/questplan`,
/// or `~/.config/questplan-dev` when `QUESTPLAN_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("QUESTPLAN_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("QUESTPLAN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("questplan-dev")
            } else {
                base_dir.join("questplan")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        defaults: &serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            // Keys that default to unset can always be cleared again
            let optional = Self::get_json_value_by_path(defaults, key)
                .is_some_and(serde_json::Value::is_null);
            if optional && matches!(value, "" | "none") {
                obj.insert(part.to_string(), serde_json::Value::Null);
                return Ok(());
            }

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => parse_number(value)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                // Optional values that are currently unset
                serde_json::Value::Null => match value {
                    "" | "none" => serde_json::Value::Null,
                    _ => parse_number(value)
                        .unwrap_or_else(|| serde_json::Value::String(value.into())),
                },
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if no file exists.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value has the wrong type,
    /// or the resulting configuration is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let to_json = |config: &Config| {
            serde_json::to_value(config).map_err(|e| ConfigError::ParseFailed(e.to_string()))
        };
        let mut json = to_json(&*self)?;
        let defaults = to_json(&Config::default())?;
        Self::set_json_value_by_path(&mut json, &defaults, key, value)?;

        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate().map_err(|message| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        })?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), String> {
        self.scheduler_config().validate().map_err(|e| e.to_string())?;
        self.blackout_window().map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Scheduler settings as engine configuration.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            num_schedules: self.scheduler.num_schedules,
            skip_probability: self.scheduler.skip_probability,
            bucket_minutes: self.scheduler.bucket_minutes,
            seed: self.scheduler.seed,
            parallel: self.scheduler.parallel,
        }
    }

    /// The configured blackout window, if enabled.
    pub fn blackout_window(&self) -> Result<Option<BlackoutWindow>, ConfigError> {
        if !self.blackout.enabled {
            return Ok(None);
        }
        let spec = format!("{}-{}", self.blackout.start, self.blackout.end);
        let window: BlackoutWindow = spec.parse().map_err(|e: crate::error::ValidationError| {
            ConfigError::InvalidValue {
                key: "blackout".to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Some(window.with_offset(self.blackout.tz_offset_minutes)))
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        Some(serde_json::Value::Number(n.into()))
    } else if let Ok(n) = value.parse::<i64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.scheduler.num_schedules, 3);
        assert_eq!(parsed.scheduler.seed, None);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[scheduler]\nskip_probability = 0.25\n").unwrap();
        assert_eq!(parsed.scheduler.skip_probability, 0.25);
        assert_eq!(parsed.scheduler.bucket_minutes, 240);
        assert_eq!(parsed.blackout.start, "23:00");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scheduler.num_schedules").as_deref(), Some("3"));
        assert_eq!(cfg.get("blackout.enabled").as_deref(), Some("false"));
        assert_eq!(cfg.get("blackout.start").as_deref(), Some("23:00"));
        assert!(cfg.get("scheduler.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("scheduler.num_schedules", "5").unwrap();
        cfg.set("scheduler.skip_probability", "0.3").unwrap();
        cfg.set("blackout.enabled", "true").unwrap();
        cfg.set("blackout.tz_offset_minutes", "-480").unwrap();
        assert_eq!(cfg.scheduler.num_schedules, 5);
        assert_eq!(cfg.scheduler.skip_probability, 0.3);
        assert!(cfg.blackout.enabled);
        assert_eq!(cfg.blackout.tz_offset_minutes, -480);
    }

    #[test]
    fn set_and_clear_optional_seed() {
        let mut cfg = Config::default();
        cfg.set("scheduler.seed", "42").unwrap();
        assert_eq!(cfg.scheduler.seed, Some(42));
        cfg.set("scheduler.seed", "none").unwrap();
        assert_eq!(cfg.scheduler.seed, None);

        cfg.set("scheduler.seed", "7").unwrap();
        cfg.set("scheduler.seed", "").unwrap();
        assert_eq!(cfg.scheduler.seed, None);
    }

    #[test]
    fn none_is_rejected_for_required_numbers() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("scheduler.num_schedules", "none"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("scheduler.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_wrong_type_and_range() {
        let mut cfg = Config::default();
        assert!(cfg.set("blackout.enabled", "maybe").is_err());
        assert!(cfg.set("scheduler.skip_probability", "1.5").is_err());
        assert!(cfg.set("scheduler.num_schedules", "0").is_err());
        assert!(cfg.set("blackout.start", "noon").is_ok());
        // Disabled blackout is not parsed; enabling it with a bad time fails.
        assert!(cfg.set("blackout.enabled", "true").is_err());
        assert_eq!(cfg.scheduler, SchedulerSection::default());
    }

    #[test]
    fn load_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("scheduler.parallel", "true").unwrap();
        changed.save_to(&path).unwrap();
        assert!(Config::load_from(&path).unwrap().scheduler.parallel);
    }

    #[test]
    fn load_reports_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scheduler = 12").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn blackout_window_follows_section() {
        let mut cfg = Config::default();
        assert_eq!(cfg.blackout_window().unwrap(), None);
        cfg.blackout.enabled = true;
        cfg.blackout.tz_offset_minutes = 60;
        let window = cfg.blackout_window().unwrap().unwrap();
        assert_eq!(window, BlackoutWindow::default().with_offset(60));
    }
}
