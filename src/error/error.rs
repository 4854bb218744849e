//! Error types and handling for the monitoring bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Main error type for the monitoring bridge
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Configuration errors (fatal at construction time)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Requested monitoring instance is not configured
    #[error("Monitoring instance not found: {instance}")]
    InstanceNotFound { instance: String },

    /// Credential exchange with an instance failed
    #[error("Authentication error for instance '{instance}' (status {status:?}): {message}")]
    Auth {
        instance: String,
        status: Option<u16>,
        message: String,
    },

    /// Upstream API returned a non-success status
    #[error("Upstream error from instance '{instance}': HTTP {status}: {message}")]
    Upstream {
        instance: String,
        status: u16,
        message: String,
    },

    /// Validation errors for caller input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors (transport, timeout, body decoding)
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl MetricsError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an instance-not-found error
    pub fn instance_not_found<S: Into<String>>(instance: S) -> Self {
        Self::InstanceNotFound {
            instance: instance.into(),
        }
    }

    /// Create an authentication error
    pub fn auth<I: Into<String>, M: Into<String>>(instance: I, status: Option<u16>, message: M) -> Self {
        Self::Auth {
            instance: instance.into(),
            status,
            message: message.into(),
        }
    }

    /// Create an upstream error
    pub fn upstream<I: Into<String>, M: Into<String>>(instance: I, status: u16, message: M) -> Self {
        Self::Upstream {
            instance: instance.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            MetricsError::Upstream { status, .. } => Some(*status),
            MetricsError::Auth { status, .. } => *status,
            MetricsError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether an authenticated call was rejected because its token is no longer valid
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, MetricsError::Upstream { status: 401, .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            MetricsError::Http(_) | MetricsError::Io(_) => true,
            MetricsError::Upstream { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            MetricsError::Config { .. } => "config",
            MetricsError::InstanceNotFound { .. } => "not_found",
            MetricsError::Auth { .. } => "auth",
            MetricsError::Upstream { .. } => "upstream",
            MetricsError::Validation { .. } => "validation",
            MetricsError::Io(_) => "io",
            MetricsError::Serde(_) => "serialization",
            MetricsError::Yaml(_) => "yaml",
            MetricsError::Http(_) => "http",
            MetricsError::Internal(_) => "internal",
        }
    }
}

impl Clone for MetricsError {
    fn clone(&self) -> Self {
        match self {
            MetricsError::Config { message } => MetricsError::Config { message: message.clone() },
            MetricsError::InstanceNotFound { instance } => MetricsError::InstanceNotFound {
                instance: instance.clone(),
            },
            MetricsError::Auth { instance, status, message } => MetricsError::Auth {
                instance: instance.clone(),
                status: *status,
                message: message.clone(),
            },
            MetricsError::Upstream { instance, status, message } => MetricsError::Upstream {
                instance: instance.clone(),
                status: *status,
                message: message.clone(),
            },
            MetricsError::Validation { message } => MetricsError::Validation { message: message.clone() },

            // For non-cloneable types, convert to string representation
            MetricsError::Io(e) => MetricsError::Internal(anyhow::anyhow!("IO error: {}", e)),
            MetricsError::Serde(e) => MetricsError::Internal(anyhow::anyhow!("Serialization error: {}", e)),
            MetricsError::Yaml(e) => MetricsError::Internal(anyhow::anyhow!("YAML error: {}", e)),
            MetricsError::Http(e) => MetricsError::Internal(anyhow::anyhow!("HTTP error: {}", e)),
            MetricsError::Internal(e) => MetricsError::Internal(anyhow::anyhow!("{}", e)),
        }
    }
}
