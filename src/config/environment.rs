//! Environment variable integration for bridge configuration

use crate::config::Config;
use crate::error::{MetricsError, Result};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Environment variable names used by the bridge
pub struct EnvVars;

impl EnvVars {
    pub const ENVIRONMENT: &'static str = "VCFO_ENV";
    pub const CONFIG_PATH: &'static str = "VCFO_CONFIG_PATH";
    pub const LOG_LEVEL: &'static str = "VCFO_LOG_LEVEL";
    pub const LOG_FORMAT: &'static str = "VCFO_LOG_FORMAT";
    pub const HTTP_TIMEOUT: &'static str = "VCFO_HTTP_TIMEOUT";
    pub const ACCEPT_INVALID_CERTS: &'static str = "VCFO_ACCEPT_INVALID_CERTS";
}

/// Environment configuration overrides
#[derive(Debug, Clone, Default)]
pub struct EnvironmentOverrides {
    pub config_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub http_timeout: Option<u64>,
    pub accept_invalid_certs: Option<bool>,
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => {
            warn!("Invalid {}: {} (expected: true/false)", name, value);
            Err(MetricsError::config(format!(
                "Invalid {}: {} (valid options: true, false)",
                name, value
            )))
        }
    }
}

impl EnvironmentOverrides {
    /// Load environment variable overrides
    pub fn load() -> Result<Self> {
        let mut overrides = EnvironmentOverrides::default();

        if let Ok(path_str) = env::var(EnvVars::CONFIG_PATH) {
            if !path_str.is_empty() {
                let path = PathBuf::from(path_str);
                debug!("Environment override: {}={:?}", EnvVars::CONFIG_PATH, path);
                overrides.config_path = Some(path);
            }
        }

        if let Ok(level) = env::var(EnvVars::LOG_LEVEL) {
            if !level.is_empty() {
                debug!("Environment override: {}={}", EnvVars::LOG_LEVEL, level);
                overrides.log_level = Some(level);
            }
        }

        if let Ok(format) = env::var(EnvVars::LOG_FORMAT) {
            if !format.is_empty() {
                debug!("Environment override: {}={}", EnvVars::LOG_FORMAT, format);
                overrides.log_format = Some(format);
            }
        }

        if let Ok(timeout_str) = env::var(EnvVars::HTTP_TIMEOUT) {
            if !timeout_str.is_empty() {
                let timeout = timeout_str.parse::<u64>().map_err(|e| {
                    MetricsError::config(format!(
                        "Invalid {} environment variable: {}",
                        EnvVars::HTTP_TIMEOUT,
                        e
                    ))
                })?;
                debug!("Environment override: {}={}", EnvVars::HTTP_TIMEOUT, timeout);
                overrides.http_timeout = Some(timeout);
            }
        }

        if let Ok(value) = env::var(EnvVars::ACCEPT_INVALID_CERTS) {
            if !value.is_empty() {
                overrides.accept_invalid_certs =
                    Some(parse_bool(EnvVars::ACCEPT_INVALID_CERTS, &value)?);
            }
        }

        Ok(overrides)
    }

    /// Apply environment overrides to a config
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(ref level) = self.log_level {
            if &config.logging.level != level {
                info!(
                    "Environment override: logging.level changed from {} to {}",
                    config.logging.level, level
                );
            }
            config.logging.level = level.clone();
        }

        if let Some(ref format) = self.log_format {
            config.logging.format = format.clone();
        }

        if let Some(timeout) = self.http_timeout {
            if config.http.timeout_secs != timeout {
                info!(
                    "Environment override: http.timeout_secs changed from {} to {}",
                    config.http.timeout_secs, timeout
                );
            }
            config.http.timeout_secs = timeout;
        }

        if let Some(accept) = self.accept_invalid_certs {
            if accept {
                warn!("Environment override: upstream certificate validation disabled");
            }
            config.http.accept_invalid_certs = accept;
        }
    }

    /// Get the effective config file path (with environment override)
    pub fn get_config_path(&self, default_path: &std::path::Path) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| default_path.to_path_buf())
    }

    /// Check if any environment overrides are active
    pub fn has_overrides(&self) -> bool {
        self.config_path.is_some()
            || self.log_level.is_some()
            || self.log_format.is_some()
            || self.http_timeout.is_some()
            || self.accept_invalid_certs.is_some()
    }

    /// Get summary of active overrides for logging
    pub fn get_override_summary(&self) -> Vec<String> {
        let mut summary = Vec::new();

        if let Some(ref path) = self.config_path {
            summary.push(format!("{}={:?}", EnvVars::CONFIG_PATH, path));
        }
        if let Some(ref level) = self.log_level {
            summary.push(format!("{}={}", EnvVars::LOG_LEVEL, level));
        }
        if let Some(ref format) = self.log_format {
            summary.push(format!("{}={}", EnvVars::LOG_FORMAT, format));
        }
        if let Some(timeout) = self.http_timeout {
            summary.push(format!("{}={}", EnvVars::HTTP_TIMEOUT, timeout));
        }
        if let Some(accept) = self.accept_invalid_certs {
            summary.push(format!("{}={}", EnvVars::ACCEPT_INVALID_CERTS, accept));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CredentialsConfig, InstanceConfig};

    #[test]
    fn test_parse_bool_variants() {
        assert!(parse_bool("X", "yes").unwrap());
        assert!(!parse_bool("X", "OFF").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::with_instances(vec![InstanceConfig {
            name: "vcfo-1".to_string(),
            base_url: "https://ops.example.com".to_string(),
            major_version: None,
            authentication: CredentialsConfig::new("admin", "pw"),
            related_instance_names: None,
        }]);

        let overrides = EnvironmentOverrides {
            log_level: Some("debug".to_string()),
            http_timeout: Some(5),
            accept_invalid_certs: Some(true),
            ..Default::default()
        };
        assert!(overrides.has_overrides());
        overrides.apply_to_config(&mut config);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.http.timeout_secs, 5);
        assert!(config.http.accept_invalid_certs);
        assert_eq!(overrides.get_override_summary().len(), 3);
    }
}
