//! Unified path management for kambo files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use std::path::{Path, PathBuf};

const APP_DIR: &str = "kambo";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution for kambo.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/kambo/              # Config directory
/// ├── config.toml               # Application configuration
/// └── secret.json               # API keys
///
/// ~/.local/share/kambo/         # Data directory
/// ├── conversations.jsonl       # Completed interactions
/// └── security_events.jsonl     # Rejected inputs
/// ```
///
/// A base path replaces both roots, which keeps tests inside a temp dir.
#[derive(Debug, Clone, Default)]
pub struct KamboPaths {
    base: Option<PathBuf>,
}

impl KamboPaths {
    /// Creates a resolver; `None` uses the platform directories.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the kambo configuration directory (e.g. `~/.config/kambo/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the kambo data directory (e.g. `~/.local/share/kambo/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.join("data"));
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to config.toml.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path_overrides_platform_dirs() {
        let paths = KamboPaths::new(Some(Path::new("/tmp/kambo-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/kambo-test/config.toml")
        );
        assert_eq!(
            paths.secret_file().unwrap(),
            PathBuf::from("/tmp/kambo-test/secret.json")
        );
        assert_eq!(paths.data_dir().unwrap(), PathBuf::from("/tmp/kambo-test/data"));
    }

    #[test]
    fn test_platform_config_dir() {
        if let Ok(config_dir) = KamboPaths::default().config_dir() {
            assert!(config_dir.ends_with("kambo"));
        }
    }
}
