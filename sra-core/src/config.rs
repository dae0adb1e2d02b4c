//! Configuration management for `sra-core`.
//!
//! Defines the runtime settings consumed by whoever wires actions to live
//! services: where credentials live, which API endpoints to call, the
//! per-invocation deadline and how remediations are recorded on findings.
//! Settings are read from YAML, then selectively overridden from the
//! environment.
//!
//! License: MIT OR Apache-2.0

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::annotation::DEFAULT_MARK_PREFIX;
use crate::clients::{DEFAULT_SECURITY_CENTER_ENDPOINT, DEFAULT_SQL_ADMIN_ENDPOINT};
use crate::errors::ConfigError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// One day.
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

pub const ENV_CREDENTIALS: &str = "SRA_CREDENTIALS";
pub const ENV_SQL_ADMIN_ENDPOINT: &str = "SRA_SQL_ADMIN_ENDPOINT";
pub const ENV_SECURITY_CENTER_ENDPOINT: &str = "SRA_SECURITY_CENTER_ENDPOINT";
pub const ENV_TOKEN_ENDPOINT: &str = "SRA_TOKEN_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "SRA_TIMEOUT_SECS";

/// API base URLs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Endpoints {
    pub sql_admin: String,
    pub security_center: String,
    /// Overrides the token URI found in the credentials file.
    pub token: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sql_admin: DEFAULT_SQL_ADMIN_ENDPOINT.to_string(),
            security_center: DEFAULT_SECURITY_CENTER_ENDPOINT.to_string(),
            token: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SraConfig {
    /// Path to a service-account or authorized-user JSON key file.
    pub credentials_file: Option<PathBuf>,
    pub endpoints: Endpoints,
    /// Deadline applied to each invocation's outbound calls.
    pub timeout_secs: u64,
    /// Write security marks on the finding after a successful remediation.
    pub annotate: bool,
    pub mark_prefix: String,
}

impl Default for SraConfig {
    fn default() -> Self {
        Self {
            credentials_file: None,
            endpoints: Endpoints::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            annotate: true,
            mark_prefix: DEFAULT_MARK_PREFIX.to_string(),
        }
    }
}

impl SraConfig {
    /// Loads and validates configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SraConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate().with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// `<config dir>/sra/config.yaml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sra").join("config.yaml"))
    }

    /// Loads `explicit` if given, else the default path if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(path),
            _ => {
                debug!("No configuration file found, using defaults.");
                Ok(Self::default())
            }
        }
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_CREDENTIALS) {
            debug!("Overriding credentials_file from {ENV_CREDENTIALS}");
            self.credentials_file = Some(PathBuf::from(path));
        }
        if let Some(url) = get(ENV_SQL_ADMIN_ENDPOINT) {
            self.endpoints.sql_admin = url;
        }
        if let Some(url) = get(ENV_SECURITY_CENTER_ENDPOINT) {
            self.endpoints.security_center = url;
        }
        if let Some(url) = get(ENV_TOKEN_ENDPOINT) {
            self.endpoints.token = Some(url);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{secs}'"))?;
        }

        self.validate()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::TimeoutTooLarge { value: self.timeout_secs, max: MAX_TIMEOUT_SECS });
        }
        if self.mark_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyMarkPrefix);
        }
        check_endpoint("sql_admin", &self.endpoints.sql_admin)?;
        check_endpoint("security_center", &self.endpoints.security_center)?;
        if let Some(token) = &self.endpoints.token {
            check_endpoint("token", token)?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn check_endpoint(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEndpoint { name, value: value.to_string() })
    }
}
