//! Settings file and command-line overrides

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::AuthConfig;

const DEFAULT_REDIRECT_PORT: u16 = 8765;
const DEFAULT_USER_AGENT: &str = "basecamp-cli (https://github.com/basecamp-cli/basecamp-cli)";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Basecamp account id used for relative API paths
    pub account_id: Option<String>,
    /// Loopback port registered as the Launchpad redirect URI
    pub redirect_port: u16,
    /// User-Agent sent with API requests (Basecamp requires contact info)
    pub user_agent: String,
    /// Token store location; defaults to the platform data dir
    pub token_store: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            account_id: None,
            redirect_port: DEFAULT_REDIRECT_PORT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            token_store: None,
        }
    }
}

/// Values given on the command line or via the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub account_id: Option<String>,
    pub redirect_port: Option<u16>,
    pub token_store: Option<PathBuf>,
}

impl Settings {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "basecamp-cli", "basecamp-cli")
            .context("Could not determine config directory")
    }

    /// Default settings file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Load settings from `path`, or the default location when `None`.
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Apply command-line values on top of the file.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(account) = overrides.account_id {
            self.account_id = Some(account);
        }
        if let Some(port) = overrides.redirect_port {
            self.redirect_port = port;
        }
        if let Some(store) = overrides.token_store {
            self.token_store = Some(store);
        }
        self
    }

    /// Resolved token store path
    pub fn token_store_path(&self) -> Result<PathBuf> {
        match self.token_store {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("tokens.toml")),
        }
    }

    pub fn account_id(&self) -> Result<&str> {
        self.account_id
            .as_deref()
            .filter(|a| !a.is_empty())
            .context("No Basecamp account configured. Pass --account or set account_id in config.toml.")
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::launchpad(self.redirect_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Some(dir.path().join("config.toml").as_path())).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.redirect_port, 8765);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "account_id = \"999\"\nredirect_port = 9000\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.account_id.as_deref(), Some("999"));
        assert_eq!(settings.redirect_port, 9000);
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(settings.auth_config().redirect_uri(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings {
            account_id: Some("1".to_string()),
            ..Default::default()
        }
        .with_overrides(Overrides {
            account_id: Some("2".to_string()),
            redirect_port: None,
            token_store: Some(PathBuf::from("/tmp/tokens.toml")),
        });

        assert_eq!(settings.account_id().unwrap(), "2");
        assert_eq!(settings.redirect_port, DEFAULT_REDIRECT_PORT);
        assert_eq!(
            settings.token_store_path().unwrap(),
            PathBuf::from("/tmp/tokens.toml")
        );
    }

    #[test]
    fn test_account_required() {
        assert!(Settings::default().account_id().is_err());
    }
}
