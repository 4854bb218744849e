//! Error handling module for the monitoring bridge
//!
//! This module provides the error taxonomy shared by every component.

mod error;

// Re-export the main error types and utilities
pub use error::{MetricsError, Result};
