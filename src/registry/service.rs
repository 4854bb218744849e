//! Instance registry
//!
//! Holds the statically configured monitoring instances and resolves names
//! to instances. The first configured instance is the default.

use crate::config::InstanceConfig;
use crate::error::{MetricsError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::types::{Instance, InstanceSummary};

/// Immutable set of monitoring instances
#[derive(Debug)]
pub struct InstanceRegistry {
    instances: Vec<Arc<Instance>>,
    by_name: HashMap<String, usize>,
}

impl InstanceRegistry {
    /// Build the registry; an empty instance list is a fatal configuration error
    pub fn new(configs: Vec<InstanceConfig>) -> Result<Self> {
        if configs.is_empty() {
            return Err(MetricsError::config(
                "At least one monitoring instance must be configured",
            ));
        }

        let mut instances = Vec::with_capacity(configs.len());
        let mut by_name = HashMap::with_capacity(configs.len());

        for config in configs {
            let instance = Instance::from_config(config)?;
            if by_name.insert(instance.name.clone(), instances.len()).is_some() {
                return Err(MetricsError::config(format!(
                    "Duplicate instance name: '{}'",
                    instance.name
                )));
            }
            debug!("Registered monitoring instance '{}' at {}", instance.name, instance.base_url);
            instances.push(Arc::new(instance));
        }

        Ok(Self { instances, by_name })
    }

    /// Resolve an instance by name, or the default instance when no name is given
    pub fn resolve(&self, instance_name: Option<&str>) -> Result<Arc<Instance>> {
        match instance_name {
            None => Ok(Arc::clone(self.default_instance())),
            Some(name) => self
                .by_name
                .get(name)
                .map(|&index| Arc::clone(&self.instances[index]))
                .ok_or_else(|| MetricsError::instance_not_found(name)),
        }
    }

    /// The first configured instance
    pub fn default_instance(&self) -> &Arc<Instance> {
        // Non-empty by construction
        &self.instances[0]
    }

    pub fn instances(&self) -> &[Arc<Instance>] {
        &self.instances
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|i| i.name.as_str())
    }

    /// Credential-free listing in configuration order
    pub fn summaries(&self) -> Vec<InstanceSummary> {
        self.instances.iter().map(|i| i.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
