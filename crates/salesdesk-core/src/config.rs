//! Application configuration management.
//!
//! `Config` is the persisted user configuration (API host, certificate
//! policy, last used phone number), stored at
//! `~/.config/salesdesk/config.json`. `ClientConfig` is the resolved runtime
//! configuration handed to the API client, with environment overrides applied.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "salesdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API host used when neither the config file nor the environment names one.
pub const DEFAULT_API_BASE_URL: &str = "https://5.75.165.29";

/// Overrides `api_base_url`.
pub const ENV_API_BASE_URL: &str = "SALESDESK_API_BASE_URL";

/// Overrides `accept_invalid_certs` ("true"/"false"/"1"/"0").
pub const ENV_ACCEPT_INVALID_CERTS: &str = "SALESDESK_ACCEPT_INVALID_CERTS";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Delay between a successful token refresh and the reinitialize signal.
const REINIT_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub accept_invalid_certs: Option<bool>,
    pub last_phone: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve the runtime client configuration, letting the process
    /// environment override the file.
    pub fn client_config(&self) -> ClientConfig {
        self.resolve(
            std::env::var(ENV_API_BASE_URL).ok(),
            std::env::var(ENV_ACCEPT_INVALID_CERTS).ok(),
        )
    }

    fn resolve(&self, env_base_url: Option<String>, env_insecure: Option<String>) -> ClientConfig {
        let mut config = ClientConfig::default();

        if let Some(url) = env_base_url
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
        {
            config.base_url = url;
        }

        if let Some(insecure) = env_insecure.as_deref().and_then(parse_bool) {
            config.accept_invalid_certs = insecure;
        } else if let Some(insecure) = self.accept_invalid_certs {
            config.accept_invalid_certs = insecure;
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Runtime settings for `ApiClient` and `AuthenticatedClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// The default host serves a self-signed certificate.
    pub accept_invalid_certs: bool,
    pub request_timeout: Duration,
    pub reinit_delay: Duration,
    /// Serialize concurrent refreshes of the same refresh token so only one
    /// hits the token endpoint.
    pub coalesce_refreshes: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            accept_invalid_certs: true,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            reinit_delay: Duration::from_millis(REINIT_DELAY_MS),
            coalesce_refreshes: false,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
