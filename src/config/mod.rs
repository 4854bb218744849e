//! Configuration module for the monitoring bridge
//!
//! This module provides configuration management and loading utilities.

mod config;
pub mod environment;

// Re-export the main configuration types
pub use config::{
    Config, ConfigResolution, CredentialsConfig, HttpConfig, InstanceConfig, LoggingConfig,
};
pub use environment::{EnvVars, EnvironmentOverrides};
