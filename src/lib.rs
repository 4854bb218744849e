//! vcfo-metrics - metrics and resource inventory client for infrastructure monitoring instances
//!
//! Talks to one or more monitoring instances over their session-token REST API:
//! per-instance token reuse with single-flight acquisition, adaptive query
//! granularity, normalization of the upstream stats encodings, and kind-aware
//! resource lookups with best-effort semantics.

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod resources;
pub mod services;
pub mod startup;

pub use config::{Config, InstanceConfig};
pub use error::{MetricsError, Result};
pub use metrics::{MetricQuery, MetricSeries, MetricsResponse, RollUpType, StatKeyList};
pub use registry::{InstanceRegistry, InstanceSummary};
pub use resources::{PropertyCondition, Resource, ResourceList, ResourceType};
pub use services::MonitoringService;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
