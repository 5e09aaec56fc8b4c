use std::fs;
use std::io;
use std::path::Path;

use solomon_common::ConfigError;
use tracing::{debug, info};

use super::paths::{default_config_path, io_error, write_default_config};
use crate::schema::ConsoleConfig;

/// Parse the file at `path`. Absent sections and keys take their defaults;
/// values are not validated here.
pub fn load_from_path(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(io_error("read", path, e)),
    };

    let config = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load the file at [`default_config_path`], seeding it from the template
/// the first time.
pub fn load_default() -> Result<ConsoleConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            if write_default_config(&path)? {
                info!(path = %path.display(), "No config found, using defaults");
            }
            Ok(ConsoleConfig::default())
        }
        loaded => loaded,
    }
}
