// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::model::ConfigFile;

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; merging with CLI flags and
/// semantic validation happen in [`crate::config::Settings::resolve`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Load the config file if it exists; an absent file is not an error, since
/// stoker is fully configurable from the command line.
pub fn load_optional(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        load_from_path(path)
    } else {
        Ok(ConfigFile::default())
    }
}

/// Default config path: `Stoker.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Stoker.toml")
}
