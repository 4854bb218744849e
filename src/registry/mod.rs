//! Registry of configured monitoring instances

pub mod service;
pub mod types;

pub use service::InstanceRegistry;
pub use types::*;
