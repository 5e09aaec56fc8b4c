//! TOML config file loading and creation.

mod loader;
mod paths;
mod template;


pub use loader::{load_default, load_from_path};
pub use paths::{default_config_path, write_default_config, CONFIG_PATH_ENV};
