//! Application configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Continuous,
    SinglePage,
}

/// User settings. Missing fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: Theme,
    /// Initial zoom of new views; clamped into the zoom limits on use.
    pub zoom_level: f32,
    pub recent_files_limit: usize,
    pub startup_directory: Option<PathBuf>,
    pub default_view: ViewMode,
    pub show_thumbnails: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            zoom_level: 1.0,
            recent_files_limit: 10,
            startup_directory: None,
            default_view: ViewMode::Continuous,
            show_thumbnails: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),
    #[error("invalid value for `{key}`: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AppConfig {
    /// Names of every setting, in declaration order.
    pub const KEYS: [&'static str; 6] = [
        "theme",
        "zoom_level",
        "recent_files_limit",
        "startup_directory",
        "default_view",
        "show_thumbnails",
    ];

    /// Current value of `key` in its JSON form.
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove(key),
            _ => None,
        }
    }

    /// Replace one setting. The configuration is unchanged on error.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        if !Self::KEYS.contains(&key) {
            return Err(ConfigError::UnknownKey(key.to_owned()));
        }

        let mut map = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        map.insert(key.to_owned(), value);

        *self = serde_json::from_value(Value::Object(map))
            .map_err(|source| ConfigError::InvalidValue { key: key.to_owned(), source })?;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
