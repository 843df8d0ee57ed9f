//! Configuration structures and parsing for rerouter

use engine::Rules;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Middleware version reported in the version header
pub const DEFAULT_VERSION: &str = "v0.0.6";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Rerouting middleware settings
    #[serde(default)]
    pub rerouter: RerouterConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rerouter.validate()
    }
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Handling of hosts with fewer than three labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShallowHosts {
    /// Answer 421 Misdirected Request
    #[default]
    Reject,
    /// Forward unchanged
    PassThrough,
}

/// Rerouting middleware configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerouterConfig {
    /// Version string stamped on forwarded requests
    #[serde(default = "default_version")]
    pub version: String,

    /// Subdomain labels that mark a GitHub alias host
    #[serde(default = "default_github_aliases")]
    pub github_aliases: Vec<String>,

    /// Second-level label of the operator's own alias domain
    #[serde(default = "default_own_domain")]
    pub own_domain: String,

    /// GitHub owner the own alias maps to
    #[serde(default = "default_own_namespace")]
    pub own_namespace: String,

    #[serde(default)]
    pub shallow_hosts: ShallowHosts,

    /// Diagnostic header names
    #[serde(default)]
    pub headers: HeaderNames,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_github_aliases() -> Vec<String> {
    Rules::default().github_aliases
}

fn default_own_domain() -> String {
    Rules::default().own_domain
}

fn default_own_namespace() -> String {
    Rules::default().own_namespace
}

impl Default for RerouterConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            github_aliases: default_github_aliases(),
            own_domain: default_own_domain(),
            own_namespace: default_own_namespace(),
            shallow_hosts: ShallowHosts::default(),
            headers: HeaderNames::default(),
        }
    }
}

impl RerouterConfig {
    /// Validate the rerouter section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Validation(
                "rerouter.version must not be empty".to_string(),
            ));
        }

        if self.github_aliases.is_empty() {
            return Err(ConfigError::Validation(
                "rerouter.github_aliases must list at least one alias".to_string(),
            ));
        }
        if let Some(alias) = self
            .github_aliases
            .iter()
            .find(|a| a.is_empty() || a.contains('.'))
        {
            return Err(ConfigError::Validation(format!(
                "Invalid GitHub alias '{}': must be a single non-empty label",
                alias
            )));
        }

        if self.own_domain.is_empty() || self.own_domain.contains('.') {
            return Err(ConfigError::Validation(format!(
                "Invalid own_domain '{}': must be a single non-empty label",
                self.own_domain
            )));
        }
        if self.own_namespace.is_empty()
            || self
                .own_namespace
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#'))
        {
            return Err(ConfigError::Validation(format!(
                "Invalid own_namespace '{}': must be a single GitHub owner",
                self.own_namespace
            )));
        }

        self.headers.validate()
    }
}

/// Names of the three diagnostic headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderNames {
    /// Carries the middleware version
    #[serde(default = "default_version_header")]
    pub version: String,

    /// Carries the URL before rewriting
    #[serde(default = "default_default_url_header")]
    pub default_url: String,

    /// Carries the URL after rewriting
    #[serde(default = "default_rerouted_url_header")]
    pub rerouted_url: String,
}

fn default_version_header() -> String {
    "X-ReRouter-Version".to_string()
}

fn default_default_url_header() -> String {
    "X-ReRouter-Default-URL".to_string()
}

fn default_rerouted_url_header() -> String {
    "X-ReRouter-ReRouted-URL".to_string()
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            version: default_version_header(),
            default_url: default_default_url_header(),
            rerouted_url: default_rerouted_url_header(),
        }
    }
}

impl HeaderNames {
    /// All names, in version / default / rerouted order
    pub fn all(&self) -> [&str; 3] {
        [&self.version, &self.default_url, &self.rerouted_url]
    }

    /// Header names must be distinct tokens and must not shadow `host`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        seen.insert("host".to_string());

        for name in self.all() {
            if name.is_empty()
                || name
                    .chars()
                    .any(|c| c.is_whitespace() || c.is_control() || c == ':')
            {
                return Err(ConfigError::Validation(format!(
                    "Invalid header name '{}'",
                    name
                )));
            }
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "Header name '{}' is used more than once",
                    name
                )));
            }
        }

        Ok(())
    }
}
