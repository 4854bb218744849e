//! Instance registry types and structures

use crate::config::InstanceConfig;
use crate::error::{MetricsError, Result};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use url::Url;

/// Credentials exchanged for a session token
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// A configured monitoring instance; immutable once loaded
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub base_url: Url,
    pub major_version: Option<u32>,
    pub credentials: Credentials,
    pub related_instance_names: Option<Vec<String>>,
}

impl Instance {
    /// Convert a configuration entry, parsing its base URL
    pub fn from_config(config: InstanceConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            MetricsError::config(format!(
                "Instance '{}' has an invalid baseUrl '{}': {}",
                config.name, config.base_url, e
            ))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(MetricsError::config(format!(
                "Instance '{}' baseUrl '{}' cannot be used as a base URL",
                config.name, config.base_url
            )));
        }

        Ok(Self {
            name: config.name,
            base_url,
            major_version: config.major_version,
            credentials: Credentials {
                username: config.authentication.username,
                password: config.authentication.password,
            },
            related_instance_names: config.related_instance_names,
        })
    }

    /// Credential-free projection for listing
    pub fn summary(&self) -> InstanceSummary {
        InstanceSummary {
            name: self.name.clone(),
            related_instance_names: self.related_instance_names.clone(),
        }
    }
}

/// Public view of an instance; never carries credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_instance_names: Option<Vec<String>>,
}
