//! Configuration loading and validation.
//!
//! ```text
//! roost.toml
//!     → toml (parse & deserialize, every field defaulted)
//!     → Config::validate (semantic checks, all problems collected)
//!     → AppContext::from_config
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::router::{AuthGuard, RouteEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub router: RouterConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the `file` backend.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub base: String,
    pub auth_guard: AuthGuardConfig,
    pub routes: Vec<RouteEntry>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base: "/".into(),
            auth_guard: AuthGuardConfig::default(),
            routes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthGuardConfig {
    pub enabled: bool,
    pub login_path: String,
    /// Storage key holding the authentication token.
    pub token_key: String,
}

impl Default for AuthGuardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            login_path: AuthGuard::DEFAULT_LOGIN_PATH.into(),
            token_key: "token".into(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks. Returns every problem, not just the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !LoggingConfig::FORMATS.contains(&self.logging.format.as_str()) {
            problems.push(format!(
                "logging.format must be one of {:?}, got '{}'",
                LoggingConfig::FORMATS,
                self.logging.format
            ));
        }
        if self.storage.backend == StorageBackend::File && self.storage.dir.is_none() {
            problems.push("storage.dir is required for the file backend".to_string());
        }
        if !self.router.base.starts_with('/') {
            problems.push(format!("router.base must start with '/', got '{}'", self.router.base));
        }
        let guard = &self.router.auth_guard;
        if !guard.login_path.starts_with('/') {
            problems.push(format!(
                "router.auth_guard.login_path must start with '/', got '{}'",
                guard.login_path
            ));
        }
        if guard.token_key.trim().is_empty() {
            problems.push("router.auth_guard.token_key must not be empty".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}
