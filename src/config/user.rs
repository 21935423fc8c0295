//! User configuration loading for editbridge.
//!
//! User config location: $XDG_CONFIG_HOME/editbridge/editbridge.toml
//! Fallback: the platform config directory (e.g. ~/.config/editbridge/editbridge.toml)

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::CONFIG_FILE_NAME;
use super::settings::SettingsLayer;

#[derive(Debug, Error)]
pub enum UserConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type UserConfigResult<T> = Result<T, UserConfigError>;

/// Returns the path to the user configuration file.
///
/// Returns None if neither $XDG_CONFIG_HOME nor a platform config directory
/// is available.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_path_from(std::env::var_os("XDG_CONFIG_HOME"), dirs::config_dir())
}

fn user_config_path_from(
    xdg_config_home: Option<OsString>,
    platform_config_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    let base = xdg_config_home
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or(platform_config_dir)?;
    Some(base.join("editbridge").join(CONFIG_FILE_NAME))
}

/// Load the user config layer. A missing file is `Ok(None)`.
pub fn load_user_config() -> UserConfigResult<Option<SettingsLayer>> {
    match user_config_path() {
        Some(path) => load_config_file(&path),
        None => Ok(None),
    }
}

/// Load one TOML settings layer from `path`. A missing file is `Ok(None)`.
pub fn load_config_file(path: &Path) -> UserConfigResult<Option<SettingsLayer>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(UserConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| UserConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
