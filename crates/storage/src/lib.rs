//! Per-user persistence: configuration, recent files and annotation sidecars.

pub mod config;
pub mod recent;
pub mod sidecar;

pub use config::{AppConfig, ConfigError, Theme, ViewMode};
pub use recent::RecentFiles;
pub use sidecar::{load_annotations, load_sidecar, sidecar_path, write_sidecar, JsonSidecar};

use directories::ProjectDirs;
use doc_model::SaveError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Overrides the data directory, mainly for tests and portable installs.
pub const DATA_DIR_ENV: &str = "FOLIO_DATA_DIR";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported file version {0}")]
    UnsupportedVersion(u32),
    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u32,
    config: AppConfig,
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs =
            ProjectDirs::from("dev", "Folio", "Folio").ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    /// `FOLIO_DATA_DIR` when set, the per-user data directory otherwise.
    pub fn from_env_or_default() -> Result<Self, StorageError> {
        match std::env::var_os(DATA_DIR_ENV) {
            Some(root) if !root.is_empty() => Ok(Self::with_root(root)),
            _ => Self::from_default_project(),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the configuration. A missing or unreadable file yields defaults;
    /// a file written with another schema version is refused.
    pub fn load_config(&self) -> Result<AppConfig, StorageError> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(AppConfig::default());
        }

        let bytes = fs::read(&path)?;
        match serde_json::from_slice::<ConfigEnvelope>(&bytes) {
            Ok(envelope) if envelope.version == CONFIG_SCHEMA_VERSION => Ok(envelope.config),
            Ok(envelope) => Err(StorageError::UnsupportedVersion(envelope.version)),
            Err(err) => {
                log::warn!("ignoring unreadable config {}: {err}", path.display());
                Ok(AppConfig::default())
            }
        }
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope = ConfigEnvelope { version: CONFIG_SCHEMA_VERSION, config: config.clone() };

        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(self.config_path(), bytes)?;
        Ok(())
    }

    /// Reset the stored configuration to defaults and return them.
    pub fn reset_config(&self) -> Result<AppConfig, StorageError> {
        let config = AppConfig::default();
        self.save_config(&config)?;
        Ok(config)
    }

    /// Load the recent-files list, capped at `limit` and without entries
    /// that no longer exist.
    pub fn load_recent_files(&self, limit: usize) -> Result<RecentFiles, StorageError> {
        let path = self.recent_files_path();
        if !path.exists() {
            return Ok(RecentFiles::new(limit));
        }

        let files: Vec<PathBuf> = serde_json::from_slice(&fs::read(path)?)?;
        Ok(RecentFiles::from_stored(files, limit))
    }

    pub fn save_recent_files(&self, recent: &RecentFiles) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        let bytes = serde_json::to_vec_pretty(recent.files())?;
        fs::write(self.recent_files_path(), bytes)?;
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    fn recent_files_path(&self) -> PathBuf {
        self.root.join("recent_files.json")
    }
}
