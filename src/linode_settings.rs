//! Credentials and endpoint settings.
//!
//! Unique responsibility: decide which API key, endpoint and HTTP limits the
//! client uses.
//!
//! Settings come from either:
//! - environment variables (a `.env` file is loaded first), or
//! - flat YAML files such as `etc/linode.yml` or `~/.linode.yml`.
//!
//! ```text
//! api_key: your_api_key_here
//! api_url: https://api.linode.com/
//! timeout_ms: 30000
//! ```

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::linode_error::LinodeError;

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.linode.com/";

/// Default HTTP timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Settings for the Linode API client.
#[derive(Clone)]
pub struct LinodeSettings {
    /// Linode API key.
    /// Env: `LINODE_API_KEY` (required)
    pub api_key: String,

    /// API endpoint.
    /// Env: `LINODE_API_URL` (default: "<https://api.linode.com/>")
    pub api_url: String,

    /// HTTP request timeout in milliseconds.
    /// Env: `LINODE_HTTP_TIMEOUT_MS` (default: 30000)
    pub timeout_ms: u64,

    /// User agent sent with every request.
    /// Env: `LINODE_USER_AGENT` (default: crate name and version)
    pub user_agent: String,
}

impl std::fmt::Debug for LinodeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinodeSettings")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// One settings file, every key optional.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    api_key: Option<String>,
    api_url: Option<String>,
    timeout_ms: Option<u64>,
    user_agent: Option<String>,
}

impl SettingsFile {
    fn merge(&mut self, other: Self) {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.user_agent.is_some() {
            self.user_agent = other.user_agent;
        }
    }
}

impl LinodeSettings {
    /// Settings for the given key with every other value defaulted.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: default_user_agent(),
        }
    }

    /// Load settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, LinodeError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            api_key: must_env("LINODE_API_KEY")?,
            api_url: env::var("LINODE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeout_ms: parse_u64_env("LINODE_HTTP_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            user_agent: env::var("LINODE_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
        })
    }

    /// Load settings from YAML files.
    ///
    /// Files are read in order and later files override earlier ones. Files
    /// that do not exist are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::Config`] if a file cannot be read or parsed, or
    /// if no file provides an `api_key`.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LinodeError> {
        let mut merged = SettingsFile::default();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let text = fs::read_to_string(path).map_err(|e| LinodeError::Config {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let file: SettingsFile =
                serde_yaml::from_str(&text).map_err(|e| LinodeError::Config {
                    path: path.display().to_string(),
                    reason: format!("must be a YAML mapping of settings: {e}"),
                })?;
            tracing::debug!(path = %path.display(), "loaded linode settings file");
            merged.merge(file);
        }

        let api_key = merged.api_key.ok_or_else(|| LinodeError::Config {
            path: render_paths(paths),
            reason: "no api_key found".to_string(),
        })?;

        Ok(Self {
            api_key,
            api_url: merged.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout_ms: merged.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            user_agent: merged.user_agent.unwrap_or_else(default_user_agent),
        })
    }

    /// The files searched by [`LinodeSettings::load`], lowest priority first.
    #[must_use]
    pub fn default_search_path() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("etc").join("linode.yml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".linode.yml"));
        }
        paths
    }

    /// Load settings from the environment if it carries an API key,
    /// otherwise from the default search path.
    ///
    /// # Errors
    ///
    /// Returns an error if neither source yields usable settings.
    pub fn load() -> Result<Self, LinodeError> {
        let _ = dotenvy::dotenv();

        if env::var("LINODE_API_KEY").is_ok() {
            return Self::from_env();
        }
        Self::from_files(&Self::default_search_path())
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn render_paths<P: AsRef<Path>>(paths: &[P]) -> String {
    paths
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn must_env(key: &'static str) -> Result<String, LinodeError> {
    env::var(key).map_err(|_| LinodeError::MissingEnv(key))
}

fn parse_u64_env(key: &'static str, default: u64) -> Result<u64, LinodeError> {
    env::var(key).map_or_else(
        |_| Ok(default),
        |v| {
            v.parse::<u64>().map_err(|_| LinodeError::InvalidEnv {
                key,
                reason: "expected an unsigned integer",
            })
        },
    )
}
