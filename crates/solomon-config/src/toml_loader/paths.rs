//! Where the console's config file lives, and seeding it from the template.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use solomon_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

/// Names a config file to use instead of the platform default.
pub const CONFIG_PATH_ENV: &str = "SOLOMON_CONFIG";

/// `$SOLOMON_CONFIG` when set, otherwise `solomon/config.toml` under the
/// platform config directory.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    resolve_config_path(std::env::var_os(CONFIG_PATH_ENV), dirs::config_dir())
}

pub(super) fn resolve_config_path(
    explicit: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    config_dir
        .map(|dir| dir.join("solomon").join("config.toml"))
        .ok_or_else(|| {
            ConfigError::ParseError(format!(
                "no platform config directory; set {CONFIG_PATH_ENV} or pass --config"
            ))
        })
}

/// Write the commented template to `path`. An existing file is left alone.
/// Returns whether a file was written.
pub fn write_default_config(path: &Path) -> Result<bool, ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| io_error("create", dir, e))?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(io_error("create", path, e)),
    };
    file.write_all(default_config_toml().as_bytes())
        .map_err(|e| io_error("write", path, e))?;

    info!(path = %path.display(), "Wrote default config");
    Ok(true)
}

pub(super) fn io_error(verb: &str, path: &Path, e: io::Error) -> ConfigError {
    ConfigError::ParseError(format!("failed to {verb} {}: {e}", path.display()))
}
