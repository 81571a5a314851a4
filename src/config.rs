//! Configuration Management
//!
//! Handles persistent configuration storage for ovindex. The password is
//! never written to disk.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the configured host
pub const HOST_ENV: &str = "ONEVIEW_HOST";
/// Environment variable overriding the configured user
pub const USER_ENV: &str = "ONEVIEW_USER";
/// Environment variable holding the password
pub const PASSWORD_ENV: &str = "ONEVIEW_PASSWORD";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Appliance host name or address
    #[serde(default)]
    pub host: Option<String>,
    /// Login user name
    #[serde(default)]
    pub username: Option<String>,
    /// Directory domain for the login, e.g. `LOCAL`
    #[serde(default)]
    pub auth_login_domain: Option<String>,
    /// `X-API-Version` to send; negotiated with the appliance when unset
    #[serde(default)]
    pub api_version: Option<u32>,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ovindex").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective host (CLI > environment > config)
    pub fn effective_host(&self) -> Option<String> {
        first_non_empty(std::env::var(HOST_ENV).ok(), self.host.clone())
    }

    /// Get effective user (CLI > environment > config > `administrator`)
    pub fn effective_username(&self) -> String {
        first_non_empty(std::env::var(USER_ENV).ok(), self.username.clone())
            .unwrap_or_else(|| "administrator".to_string())
    }
}

fn first_non_empty(preferred: Option<String>, fallback: Option<String>) -> Option<String> {
    preferred
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.filter(|v| !v.is_empty()))
}

/// Turn a bare host into an `https://` base URL; explicit schemes are kept
pub fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("https://") || host.starts_with("http://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("oneview.example.com"), "https://oneview.example.com");
        assert_eq!(base_url("http://127.0.0.1:8080/"), "http://127.0.0.1:8080");
        assert_eq!(base_url(" 10.0.0.5 "), "https://10.0.0.5");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("ovindex-config-test-{}", std::process::id()));
        let path = dir.join("config.json");

        let config = Config {
            host: Some("oneview.example.com".to_string()),
            username: Some("operator".to_string()),
            auth_login_domain: Some("LOCAL".to_string()),
            api_version: Some(800),
            insecure: true,
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_or_partial() {
        let dir = std::env::temp_dir().join(format!("ovindex-config-partial-{}", std::process::id()));
        let path = dir.join("config.json");
        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, r#"{"host": "10.0.0.5"}"#).unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.host.as_deref(), Some("10.0.0.5"));
        assert!(!config.insecure);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_environment_overrides_config_file() {
        assert_eq!(
            first_non_empty(Some("from-env".to_string()), Some("from-file".to_string())).as_deref(),
            Some("from-env")
        );
        assert_eq!(
            first_non_empty(None, Some("from-file".to_string())).as_deref(),
            Some("from-file")
        );
        assert_eq!(
            first_non_empty(Some(String::new()), Some("from-file".to_string())).as_deref(),
            Some("from-file")
        );
        assert_eq!(first_non_empty(None, Some(String::new())), None);
    }
}
