//! Configuration management for the monitoring bridge

use super::environment::EnvironmentOverrides;
use crate::error::{MetricsError, Result};
use crate::metrics::IntervalPolicy;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Custom serde module for Secret<String>
mod secret_string {
    use secrecy::{ExposeSecret, Secret};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(secret.expose_secret())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Secret<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Secret::new(s))
    }
}

/// A loaded configuration together with the file and overrides that produced it
#[derive(Debug, Clone)]
pub struct ConfigResolution {
    pub config: Config,
    /// Effective file path after `VCFO_CONFIG_PATH`
    pub config_path: PathBuf,
    pub overrides: EnvironmentOverrides,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Monitoring instances; the first entry is the default
    pub instances: Vec<InstanceConfig>,
    /// Upstream HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Query granularity policy
    #[serde(default)]
    pub intervals: IntervalPolicy,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One monitoring instance as written in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    /// Unique instance name
    pub name: String,
    /// Base URL, e.g. `https://ops.example.com`
    pub base_url: String,
    /// Major product version, informational
    #[serde(default)]
    pub major_version: Option<u32>,
    /// Credentials exchanged for a session token
    pub authentication: CredentialsConfig,
    /// Names of instances monitoring the same estate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_instance_names: Option<Vec<String>>,
}

/// Username/password pair for the token acquisition endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    #[serde(with = "secret_string")]
    pub password: Secret<String>,
}

impl CredentialsConfig {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password.into()),
        }
    }
}

/// HTTP client configuration shared by every instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Accept self-signed upstream certificates
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// User agent sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Validate HTTP configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(MetricsError::config("HTTP timeout must be greater than 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(MetricsError::config("HTTP user agent cannot be empty"));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Check a level name before it reaches a filter
    pub fn validate_level(level: &str) -> Result<()> {
        match level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(MetricsError::config(format!(
                "Invalid log level: '{}'. Valid levels: trace, debug, info, warn, error",
                level
            ))),
        }
    }

    /// Validate logging configuration
    pub fn validate(&self) -> Result<()> {
        Self::validate_level(&self.level)?;

        match self.format.to_lowercase().as_str() {
            "json" | "text" => {}
            _ => {
                return Err(MetricsError::config(format!(
                    "Invalid log format: '{}'. Valid formats: json, text",
                    self.format
                )))
            }
        }

        Ok(())
    }
}

impl InstanceConfig {
    /// Validate a single instance entry
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MetricsError::config("Instance name cannot be empty"));
        }

        let url = Url::parse(&self.base_url).map_err(|e| {
            MetricsError::config(format!(
                "Instance '{}' has an invalid baseUrl '{}': {}",
                self.name, self.base_url, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(MetricsError::config(format!(
                "Instance '{}' baseUrl must use http or https, got '{}'",
                self.name,
                url.scheme()
            )));
        }

        if self.authentication.username.trim().is_empty() {
            return Err(MetricsError::config(format!(
                "Instance '{}' has an empty authentication username",
                self.name
            )));
        }

        Ok(())
    }

    /// Expand `${VAR}` references in URL and credentials
    fn expand_env(&mut self) -> Result<()> {
        self.base_url = expand(&self.name, "baseUrl", &self.base_url)?;
        self.authentication.username = expand(&self.name, "username", &self.authentication.username)?;
        let password = expand(
            &self.name,
            "password",
            self.authentication.password.expose_secret(),
        )?;
        self.authentication.password = Secret::new(password);
        Ok(())
    }
}

/// Expand only braced `${VAR}` references; a bare `$` is kept literally
fn expand(instance: &str, field: &str, value: &str) -> Result<String> {
    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(close) = tail.find('}') else {
            expanded.push_str(tail);
            return Ok(expanded);
        };

        let reference = &tail[..=close];
        let resolved = shellexpand::env(reference).map_err(|e| {
            MetricsError::config(format!(
                "Instance '{}' {}: cannot expand variable '{}': {}",
                instance, field, e.var_name, e.cause
            ))
        })?;
        expanded.push_str(&resolved);
        rest = &tail[close + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

impl Config {
    /// Build a configuration from instances with default ambient settings
    pub fn with_instances(instances: Vec<InstanceConfig>) -> Self {
        Self {
            instances,
            http: HttpConfig::default(),
            intervals: IntervalPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load .env files in order of precedence
    fn load_env_files() {
        let env = std::env::var(super::environment::EnvVars::ENVIRONMENT)
            .unwrap_or_else(|_| "development".to_string());

        let env_specific_file = format!(".env.{}", env);
        let env_files = [".env", env_specific_file.as_str(), ".env.local"];

        for env_file in env_files {
            match dotenvy::from_filename(env_file) {
                Ok(_) => {
                    tracing::info!("Loaded environment variables from {}", env_file);
                }
                Err(e) if e.not_found() => {
                    tracing::debug!("No {} file found, skipping", env_file);
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", env_file, e);
                }
            }
        }
    }

    /// Load configuration from a YAML file, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::load_with_resolution(path)?.config)
    }

    /// Load configuration and keep track of where it came from
    pub fn load_with_resolution<P: AsRef<Path>>(path: P) -> Result<ConfigResolution> {
        Self::load_env_files();

        let overrides = EnvironmentOverrides::load()?;
        let config_path = overrides.get_config_path(path.as_ref());

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            MetricsError::config(format!("Failed to read config file {:?}: {}", config_path, e))
        })?;

        let mut config = Self::from_yaml(&content)?;
        overrides.apply_to_config(&mut config);
        config.validate()?;

        Ok(ConfigResolution {
            config,
            config_path,
            overrides,
        })
    }

    /// Parse YAML content and expand environment references; does not validate
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(content)
            .map_err(|e| MetricsError::config(format!("Failed to parse config file: {}", e)))?;

        for instance in &mut config.instances {
            instance.expand_env()?;
        }

        Ok(config)
    }

    /// Validate the configuration with comprehensive checks
    pub fn validate(&self) -> Result<()> {
        if self.instances.is_empty() {
            return Err(MetricsError::config(
                "At least one monitoring instance must be configured",
            ));
        }

        let mut names = HashSet::new();
        for instance in &self.instances {
            instance.validate()?;
            if !names.insert(instance.name.as_str()) {
                return Err(MetricsError::config(format!(
                    "Duplicate instance name: '{}'",
                    instance.name
                )));
            }
        }

        for instance in &self.instances {
            for related in instance.related_instance_names.iter().flatten() {
                if !names.contains(related.as_str()) {
                    tracing::warn!(
                        "Instance '{}' lists related instance '{}' which is not configured",
                        instance.name,
                        related
                    );
                }
            }
        }

        self.http.validate()?;
        self.intervals.validate()?;
        self.logging.validate()?;

        Ok(())
    }
}
