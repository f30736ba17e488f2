//! Configuration loading and persistence.
//!
//! Handles reading and writing the embedding host configuration file, with
//! `EMBED_*` environment variables taking precedence over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::constants;
use crate::env::Environment;

/// Configuration for the embedding host.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Route that (re)establishes the embedded session.
    pub connect_session_url: String,
    /// Route showing the error view inside the embedded surface.
    pub error_view_url: String,
    /// Host sign-in entry point, used after cleanup.
    pub sign_in_url: String,
    /// Section used for the default landing target.
    pub default_section_id: String,
    /// Room used for the default landing target.
    pub default_room_id: String,
    /// Seconds between keep-alive signals.
    pub keep_alive_interval_secs: u64,
    /// Seconds an idle collaborator session lives.
    pub session_lifetime_secs: u64,
    /// Timeout in seconds for collaborator HTTP calls.
    pub http_timeout_secs: u64,
    /// Log debug-category signals.
    pub debug_enabled: bool,
    /// Reload the surface at the connect route after auto-provisioning,
    /// for hosts whose cookies cannot ride the collaborator's redirect.
    pub reload_on_auto_provision: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connect_session_url: constants::CONNECT_SESSION_URL.to_string(),
            error_view_url: constants::ERROR_VIEW_URL.to_string(),
            sign_in_url: constants::SIGN_IN_URL.to_string(),
            default_section_id: constants::DEFAULT_SECTION_ID.to_string(),
            default_room_id: constants::DEFAULT_ROOM_ID.to_string(),
            keep_alive_interval_secs: constants::DEFAULT_KEEP_ALIVE_INTERVAL.as_secs(),
            session_lifetime_secs: constants::DEFAULT_SESSION_LIFETIME.as_secs(),
            http_timeout_secs: constants::HTTP_REQUEST_TIMEOUT.as_secs(),
            debug_enabled: Environment::current().is_development(),
            reload_on_auto_provision: false,
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// `EMBED_CONFIG_DIR` overrides the platform config directory. The test
    /// environment falls back to a directory under the system temp dir.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = std::env::var("EMBED_CONFIG_DIR") {
            PathBuf::from(dir)
        } else if Environment::current().is_test() {
            std::env::temp_dir().join("embedding-host-test")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("embedding-host")
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?.unwrap_or_default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn load_from_file() -> Result<Option<Self>> {
        let config_path = Self::config_dir()?.join("config.json");
        if !config_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;
        Ok(Some(config))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("EMBED_CONNECT_SESSION_URL") {
            self.connect_session_url = url;
        }

        if let Ok(url) = std::env::var("EMBED_SIGN_IN_URL") {
            self.sign_in_url = url;
        }

        if let Ok(interval) = std::env::var("EMBED_KEEP_ALIVE_INTERVAL") {
            if let Ok(secs) = interval.parse::<u64>() {
                self.keep_alive_interval_secs = secs;
            }
        }

        if let Ok(timeout) = std::env::var("EMBED_HTTP_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.http_timeout_secs = secs;
            }
        }

        if let Ok(debug) = std::env::var("EMBED_DEBUG") {
            self.debug_enabled = matches!(debug.as_str(), "1" | "true" | "yes");
        }
    }

    /// Check that the keep-alive period renews the session before it expires.
    pub fn validate(&self) -> Result<()> {
        if self.keep_alive_interval_secs == 0 {
            anyhow::bail!("keep_alive_interval_secs must be greater than zero");
        }
        if self.keep_alive_interval_secs >= self.session_lifetime_secs {
            anyhow::bail!(
                "keep_alive_interval_secs ({}) must be shorter than session_lifetime_secs ({})",
                self.keep_alive_interval_secs,
                self.session_lifetime_secs
            );
        }

        let interval = self.keep_alive_interval();
        if interval < constants::RECOMMENDED_RENEWAL_MIN
            || interval > constants::RECOMMENDED_RENEWAL_MAX
        {
            log::warn!(
                "Keep-alive interval of {}s is outside the recommended 10-15 minute window",
                self.keep_alive_interval_secs
            );
        }
        Ok(())
    }

    /// Persists the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_dir()?.join("config.json");
        fs::write(&config_path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(())
    }

    /// Keep-alive period as a [`Duration`].
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_interval_secs)
    }

    /// HTTP timeout as a [`Duration`].
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
