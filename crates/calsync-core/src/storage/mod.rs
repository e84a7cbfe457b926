pub mod config;

pub use config::Settings;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/calsync[-dev]/` based on CALSYNC_ENV.
///
/// Set CALSYNC_ENV=dev to use a development directory, or
/// CALSYNC_CONFIG_DIR to use an explicit one.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CALSYNC_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CALSYNC_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("calsync-dev")
            } else {
                base_dir.join("calsync")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::NoDataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
