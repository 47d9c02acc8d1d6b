//! Service configuration.
//!
//! A single immutable [`ServiceConfig`] is built at startup (defaults, then an
//! optional TOML file, then environment overrides) and handed to every
//! component at construction. Nothing reads configuration from globals.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Configuration shared by the CLI and the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the vocabulary REST API, always ending in `/`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Language used when a caller does not name one.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Externally visible base URL of this service. When unset the HTTP
    /// server derives it from the request's `Host` header.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Timeout for each outbound vocabulary API call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_preview_width")]
    pub preview_width: u32,
    #[serde(default = "default_preview_height")]
    pub preview_height: u32,
    /// Window size for suggestion paging.
    #[serde(default = "default_suggest_page_size")]
    pub suggest_page_size: usize,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_api_base_url() -> String {
    "http://api.finto.fi/rest/v1/".into()
}
fn default_language() -> String {
    "en".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_preview_width() -> u32 {
    430
}
fn default_preview_height() -> u32 {
    300
}
fn default_suggest_page_size() -> usize {
    20
}
fn default_bind() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8300
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            default_language: default_language(),
            public_url: None,
            timeout_secs: default_timeout_secs(),
            preview_width: default_preview_width(),
            preview_height: default_preview_height(),
            suggest_page_size: default_suggest_page_size(),
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServiceConfig {
    /// Config pointing at a specific vocabulary API (other fields default).
    pub fn with_api_base_url(url: &str) -> Self {
        let mut config = Self {
            api_base_url: url.to_string(),
            ..Default::default()
        };
        config.normalize();
        config
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Config as the binaries see it: the file at `path` (or defaults),
    /// then environment overrides, then an explicit API URL.
    pub fn resolve(path: Option<&Path>, api_base_url: Option<&str>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        if let Some(url) = api_base_url {
            config.api_base_url = url.to_string();
            config.normalize();
        }
        Ok(config)
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let mut config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })?;
        config.normalize();
        Ok(config)
    }

    /// Apply `SKOSREC_*` environment overrides.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(url) = lookup("SKOSREC_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = lookup("SKOSREC_PUBLIC_URL") {
            self.public_url = Some(url);
        }
        if let Some(bind) = lookup("SKOSREC_BIND") {
            self.bind = bind;
        }
        if let Some(port) = lookup("SKOSREC_PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SKOSREC_PORT".into(),
                value: port.clone(),
            })?;
        }
        if let Some(secs) = lookup("SKOSREC_TIMEOUT_SECS") {
            self.timeout_secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SKOSREC_TIMEOUT_SECS".into(),
                value: secs.clone(),
            })?;
        }
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        if !self.api_base_url.ends_with('/') {
            self.api_base_url.push('/');
        }
        if let Some(url) = &mut self.public_url {
            while url.ends_with('/') {
                url.pop();
            }
        }
    }
}
