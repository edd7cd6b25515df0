//! Layered configuration: defaults, `isotrack.toml`, environment, CLI flags.

use crate::core::catalog::CatalogSource;
use crate::core::error::TrackerError;
use crate::core::store::StoreOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "isotrack.toml";
pub const DEFAULT_DATA_FILE: &str = "iso27001_data.json";
pub const DATA_FILE_ENV: &str = "ISOTRACK_DATA_FILE";

/// Contents of `isotrack.toml`. Every key is optional.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub data_file: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub audit_log: Option<bool>,
}

/// Values supplied on the command line.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub config: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub data_file: PathBuf,
    pub catalog: CatalogSource,
    pub audit_log: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            catalog: CatalogSource::Embedded,
            audit_log: true,
        }
    }
}

impl TrackerConfig {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            audit_log: self.audit_log,
        }
    }
}

/// Load `isotrack.toml`. A missing file yields the empty config.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, TrackerError> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| TrackerError::ConfigError(format!("{}: {}", path.display(), e)))
}

/// Resolve the effective configuration relative to `work_dir`.
/// `env_data_file` is the value of [`DATA_FILE_ENV`], if set.
pub fn resolve(
    work_dir: &Path,
    env_data_file: Option<String>,
    overrides: &ConfigOverrides,
) -> Result<TrackerConfig, TrackerError> {
    let explicit = overrides.config.is_some();
    let config_path = match &overrides.config {
        Some(p) => work_dir.join(p),
        None => work_dir.join(CONFIG_FILE_NAME),
    };
    if explicit && !config_path.exists() {
        return Err(TrackerError::ConfigError(format!(
            "config file not found: {}",
            config_path.display()
        )));
    }
    let file = load_config_file(&config_path)?;
    // Relative paths inside the config file are relative to the file itself.
    let file_dir = config_path.parent().unwrap_or(work_dir);

    let mut config = TrackerConfig {
        data_file: work_dir.join(DEFAULT_DATA_FILE),
        ..TrackerConfig::default()
    };
    if let Some(p) = file.data_file {
        config.data_file = file_dir.join(p);
    }
    if let Some(p) = file.catalog {
        config.catalog = CatalogSource::File(file_dir.join(p));
    }
    if let Some(audit) = file.audit_log {
        config.audit_log = audit;
    }

    if let Some(p) = env_data_file.filter(|s| !s.trim().is_empty()) {
        config.data_file = work_dir.join(p);
    }

    if let Some(p) = &overrides.data_file {
        config.data_file = work_dir.join(p);
    }
    if let Some(p) = &overrides.catalog {
        config.catalog = CatalogSource::File(work_dir.join(p));
    }

    Ok(config)
}
