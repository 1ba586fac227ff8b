//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/fuente/`
//! - macOS: `~/Library/Application Support/fuente/`
//! - Windows: `%APPDATA%\fuente\`

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "fuente";

/// File name of the engine configuration inside the user config directory.
pub const ENGINE_CONFIG_FILE: &str = "engine.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the user's engine configuration file (it may not exist).
pub fn default_engine_config_path() -> PathBuf {
    user_config_dir().join(ENGINE_CONFIG_FILE)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

/// Resolve a configuration name to an existing file.
///
/// `name` may be a path to a file, or a bare name (with or without
/// `.toml`) looked up in [`user_config_dir`].
pub fn find_config(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    let user_path = user_config_dir().join(filename);
    user_path.is_file().then_some(user_path)
}
