//! core::config
//!
//! Workspace configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order:
//! 1. `$TESSERA_CONFIG` if set
//! 2. `<workspace>/.tessera/workspace.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing so a malformed default
//! scope or lane surfaces at load time, not deep inside an operation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{LaneName, Scope};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Workspace configuration.
///
/// # Example
///
/// ```toml
/// default_scope = "acme.ui"
/// default_lane = "main"
/// components_root = "components"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Scope newly tracked components are assigned to
    pub default_scope: Option<String>,

    /// Lane the workspace is checked out on
    pub default_lane: Option<String>,

    /// Directory component sources live under, relative to the
    /// workspace root
    pub components_root: Option<String>,
}

impl WorkspaceConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(scope) = &self.default_scope {
            Scope::new(scope.clone())
                .map_err(|e| ConfigError::InvalidValue(format!("invalid default scope: {e}")))?;
        }

        if let Some(lane) = &self.default_lane {
            LaneName::new(lane.clone())
                .map_err(|e| ConfigError::InvalidValue(format!("invalid default lane: {e}")))?;
        }

        if let Some(root) = &self.components_root {
            if root.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "components_root cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Loaded configuration with accessor methods applying defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Raw workspace configuration
    pub workspace: WorkspaceConfig,
    /// Path to the loaded config file (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration for a workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error (defaults are
    /// used).
    pub fn load(workspace_root: &Path) -> Result<Self, ConfigError> {
        let (workspace, path) = Self::load_workspace(workspace_root)?;
        workspace.validate()?;
        Ok(Self { workspace, path })
    }

    fn load_workspace(
        workspace_root: &Path,
    ) -> Result<(WorkspaceConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $TESSERA_CONFIG
        if let Ok(path) = std::env::var("TESSERA_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check <workspace>/.tessera/workspace.toml
        let canonical = Self::config_path(workspace_root);
        if canonical.exists() {
            let config = Self::read_config(&canonical)?;
            return Ok((config, Some(canonical)));
        }

        Ok((WorkspaceConfig::default(), None))
    }

    fn read_config(path: &Path) -> Result<WorkspaceConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The canonical config path for a workspace.
    pub fn config_path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(".tessera/workspace.toml")
    }

    /// Write workspace config atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write (write to
    /// temp file, then rename) to prevent corruption.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the write fails.
    pub fn write(workspace_root: &Path, config: &WorkspaceConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::config_path(workspace_root);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        // Write to temp file in same directory (for atomic rename)
        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;
        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &path).map_err(|e| ConfigError::WriteError {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// The workspace's default scope, if configured.
    pub fn default_scope(&self) -> Option<Scope> {
        // validated at load time
        self.workspace
            .default_scope
            .as_ref()
            .and_then(|s| Scope::new(s.clone()).ok())
    }

    /// The lane the workspace is checked out on.
    ///
    /// Defaults to the default lane if not configured.
    pub fn active_lane(&self) -> LaneName {
        self.workspace
            .default_lane
            .as_ref()
            .and_then(|l| LaneName::new(l.clone()).ok())
            .unwrap_or_else(LaneName::default_lane)
    }

    /// The directory component sources live under.
    ///
    /// Defaults to "components" if not configured.
    pub fn components_root(&self) -> &str {
        self.workspace
            .components_root
            .as_deref()
            .unwrap_or("components")
    }

    /// The path the config was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_empty_defaults() {
        std::env::remove_var("TESSERA_CONFIG");

        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();

        assert!(config.default_scope().is_none());
        assert!(config.active_lane().is_default());
        assert_eq!(config.components_root(), "components");
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_workspace_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".tessera");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("workspace.toml"),
            r#"
            default_scope = "acme.ui"
            default_lane = "feature-x"
            "#,
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();

        assert_eq!(config.default_scope().unwrap().to_string(), "acme.ui");
        assert_eq!(config.active_lane().to_string(), "feature-x");
    }

    #[test]
    fn write_then_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let workspace = WorkspaceConfig {
            default_scope: Some("acme.ui".to_string()),
            default_lane: Some("main".to_string()),
            components_root: Some("libs".to_string()),
        };

        let path = Config::write(temp.path(), &workspace).unwrap();
        assert!(path.exists());

        let loaded = Config::load(temp.path()).unwrap();
        assert_eq!(loaded.workspace, workspace);
        assert_eq!(loaded.components_root(), "libs");
    }

    #[test]
    fn invalid_default_scope_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".tessera");
        fs::create_dir_all(&dir).unwrap();
        // scopes must contain a dot
        fs::write(dir.join("workspace.toml"), "default_scope = \"noscope\"").unwrap();

        assert!(Config::load(temp.path()).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".tessera");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("workspace.toml"),
            r#"
            default_lane = "main"
            unknown_field = true
            "#,
        )
        .unwrap();

        assert!(Config::load(temp.path()).is_err());
    }
}
