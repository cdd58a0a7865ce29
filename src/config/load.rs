use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::app_dirs;

use super::CONFIG_FILE_NAME;
use super::map_app_dir_error;
use super::types::{ConfigError, EnoseConfig};

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load configuration, returning defaults if the file is missing.
///
/// An explicit path must exist. Without one, `<config root>/.enose/config.toml` is used when
/// present. Relative data paths in a loaded file resolve against that file's directory;
/// defaults stay relative to the working directory.
pub fn load_or_default(explicit: Option<&Path>) -> Result<EnoseConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = config_path()?;
            if !path.exists() {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(EnoseConfig::default());
            }
            path
        }
    };
    load_from_path(&path)
}

/// Parse one TOML file and resolve its relative paths.
pub fn load_from_path(path: &Path) -> Result<EnoseConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse_str(&text, path)?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

pub(super) fn parse_str(text: &str, path: &Path) -> Result<EnoseConfig, ConfigError> {
    let config: EnoseConfig = toml::from_str(text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    let mut seen = BTreeSet::new();
    for class in &config.trainer.classes {
        if !seen.insert(class.id) {
            return Err(ConfigError::DuplicateClass {
                path: path.to_path_buf(),
                id: class.id,
            });
        }
    }
    Ok(config.normalized())
}
