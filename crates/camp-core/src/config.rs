//! Credential configuration
//!
//! Credentials come from the environment first and fall back to a
//! `config.json` in the config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::paths::Paths;

pub const ACCESS_TOKEN_ENV: &str = "BASECAMP_ACCESS_TOKEN";
pub const ACCOUNT_ID_ENV: &str = "BASECAMP_ACCOUNT_ID";
pub const REFRESH_TOKEN_ENV: &str = "BASECAMP_REFRESH_TOKEN";
pub const CLIENT_ID_ENV: &str = "BASECAMP_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "BASECAMP_CLIENT_SECRET";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Basecamp credentials not found. Set BASECAMP_ACCESS_TOKEN or create {}",
        .0.display()
    )]
    MissingCredentials(PathBuf),

    #[error("Failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Basecamp credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub access_token: String,

    /// Resolved from `/authorization.json` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl Config {
    /// Load from the process environment, then from `config.json`
    pub fn load(paths: &Paths) -> Result<Self, ConfigError> {
        Self::load_with(paths, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injectable environment lookup
    pub fn load_with<F>(paths: &Paths, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(config) = Self::from_lookup(&lookup) {
            return Ok(config);
        }

        let path = paths.config_file();
        if let Some(config) = Self::from_file(&path) {
            return Ok(config);
        }

        Err(ConfigError::MissingCredentials(path))
    }

    fn from_lookup<F>(lookup: &F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_token = non_empty(ACCESS_TOKEN_ENV)?;
        Some(Self {
            access_token,
            account_id: non_empty(ACCOUNT_ID_ENV),
            refresh_token: non_empty(REFRESH_TOKEN_ENV),
            client_id: non_empty(CLIENT_ID_ENV),
            client_secret: non_empty(CLIENT_SECRET_ENV),
        })
    }

    fn from_file(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Config>(&content) {
            Ok(config) if !config.access_token.is_empty() => Some(config),
            Ok(_) => None,
            Err(e) => {
                warn!("Error reading config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write this config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        write_file(path, &content)
    }

    /// Write a placeholder config showing every recognised key
    pub fn write_sample(path: &Path) -> Result<(), ConfigError> {
        let sample = Config {
            access_token: "YOUR_BASECAMP_ACCESS_TOKEN".to_string(),
            account_id: Some("YOUR_BASECAMP_ACCOUNT_ID (optional)".to_string()),
            refresh_token: Some("YOUR_REFRESH_TOKEN (optional)".to_string()),
            client_id: Some("YOUR_CLIENT_ID (optional, for OAuth)".to_string()),
            client_secret: Some("YOUR_CLIENT_SECRET (optional, for OAuth)".to_string()),
        };
        sample.save(path)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    let to_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_err)?;
    }
    fs::write(path, content).map_err(to_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_takes_precedence() {
        let tmp = TempDir::new().unwrap();
        let paths = Paths::rooted(tmp.path());
        Config {
            access_token: "from-file".to_string(),
            ..Default::default()
        }
        .save(&paths.config_file())
        .unwrap();

        let config = Config::load_with(
            &paths,
            env(&[(ACCESS_TOKEN_ENV, "from-env"), (ACCOUNT_ID_ENV, "42")]),
        )
        .unwrap();

        assert_eq!(config.access_token, "from-env");
        assert_eq!(config.account_id.as_deref(), Some("42"));
        assert_eq!(config.refresh_token, None);
    }

    #[test]
    fn test_falls_back_to_file() {
        let tmp = TempDir::new().unwrap();
        let paths = Paths::rooted(tmp.path());
        fs::create_dir_all(&paths.config).unwrap();
        fs::write(
            paths.config_file(),
            r#"{ "accessToken": "tok", "accountId": "7" }"#,
        )
        .unwrap();

        let config = Config::load_with(&paths, env(&[])).unwrap();
        assert_eq!(config.access_token, "tok");
        assert_eq!(config.account_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_blank_env_token_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let paths = Paths::rooted(tmp.path());

        let err = Config::load_with(&paths, env(&[(ACCESS_TOKEN_ENV, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials(_)));
    }

    #[test]
    fn test_file_without_token_is_missing() {
        let tmp = TempDir::new().unwrap();
        let paths = Paths::rooted(tmp.path());
        fs::create_dir_all(&paths.config).unwrap();
        fs::write(paths.config_file(), r#"{ "accountId": "7" }"#).unwrap();

        assert!(Config::load_with(&paths, env(&[])).is_err());
    }

    #[test]
    fn test_sample_config_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.example.json");
        Config::write_sample(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"accessToken\""));
        assert!(content.contains("\"clientSecret\""));
    }
}
