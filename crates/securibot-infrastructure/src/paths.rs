//! Unified path management for securibot configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/securibot/         # Config directory (platform dependent)
//! ├── config.toml              # Client configuration
//! └── credentials.json         # Signed-in principal and bearer token
//! ```

use securibot_core::SecuribotError;
use std::path::PathBuf;

const APP_DIR: &str = "securibot";

pub struct SecuribotPaths;

impl SecuribotPaths {
    /// Returns the securibot configuration directory.
    pub fn config_dir() -> Result<PathBuf, SecuribotError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| SecuribotError::config("Cannot find home directory"))
    }

    /// Returns the path to config.toml.
    pub fn config_file() -> Result<PathBuf, SecuribotError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to credentials.json.
    ///
    /// # Security Note
    ///
    /// The file holds a bearer token and should be readable by the owner only.
    pub fn credentials_file() -> Result<PathBuf, SecuribotError> {
        Ok(Self::config_dir()?.join("credentials.json"))
    }
}
