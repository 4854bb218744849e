//! Monitoring service facade
//!
//! Every public operation resolves the target instance (the first configured
//! one when no name is given), binds it to the shared HTTP client and
//! authenticator, and delegates to the metrics engine or the resource resolver.

use crate::auth::Authenticator;
use crate::clients::{InstanceSession, SuiteApiClient};
use crate::config::{Config, InstanceConfig};
use crate::error::Result;
use crate::metrics::{MetricQuery, MetricsQueryEngine, MetricsResponse, RollUpType, StatKeyList};
use crate::registry::{InstanceRegistry, InstanceSummary};
use crate::resources::{
    ConjunctionOperator, KindFilter, PropertyCondition, Resource, ResourceList, ResourceResolver,
    ResourceType, SearchFilter,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct MonitoringService {
    registry: InstanceRegistry,
    api: Arc<SuiteApiClient>,
    auth: Authenticator,
    metrics: MetricsQueryEngine,
    resources: ResourceResolver,
}

impl MonitoringService {
    /// Build the service from a loaded configuration; an empty instance list is fatal
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let Config {
            instances,
            http,
            intervals,
            ..
        } = config;

        let registry = InstanceRegistry::new(instances)?;
        let api = Arc::new(SuiteApiClient::new(&http)?);
        let auth = Authenticator::new(Arc::clone(&api), registry.names());

        info!(
            "Monitoring service ready with {} instance(s), default '{}'",
            registry.len(),
            registry.default_instance().name
        );

        Ok(Self {
            registry,
            api,
            auth,
            metrics: MetricsQueryEngine::new(intervals),
            resources: ResourceResolver::new(),
        })
    }

    /// Build the service with default HTTP and interval settings
    pub fn from_instances(instances: Vec<InstanceConfig>) -> Result<Self> {
        Self::new(Config::with_instances(instances))
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    pub fn metrics_engine(&self) -> &MetricsQueryEngine {
        &self.metrics
    }

    fn session(&self, instance_name: Option<&str>) -> Result<InstanceSession<'_>> {
        let instance = self.registry.resolve(instance_name)?;
        Ok(InstanceSession::new(instance, &self.api, &self.auth))
    }

    /// Configured instances without credentials
    pub fn get_instances(&self) -> Vec<InstanceSummary> {
        self.registry.summaries()
    }

    /// Drop the cached token of an instance so the next call re-authenticates
    pub fn invalidate_token(&self, instance_name: Option<&str>) -> Result<bool> {
        let instance = self.registry.resolve(instance_name)?;
        self.auth.invalidate_instance(&instance.name)
    }

    pub async fn get_resource_metrics(
        &self,
        resource_id: &str,
        stat_keys: &[String],
        begin: Option<i64>,
        end: Option<i64>,
        roll_up_type: Option<RollUpType>,
        instance_name: Option<&str>,
    ) -> Result<MetricsResponse> {
        let session = self.session(instance_name)?;
        self.metrics
            .get_resource_metrics(&session, resource_id, stat_keys, begin, end, roll_up_type)
            .await
    }

    pub async fn get_latest_resource_metrics(
        &self,
        resource_ids: &[String],
        stat_keys: &[String],
        instance_name: Option<&str>,
    ) -> Result<MetricsResponse> {
        let session = self.session(instance_name)?;
        self.metrics
            .get_latest_resource_metrics(&session, resource_ids, stat_keys)
            .await
    }

    pub async fn query_resource_metrics(
        &self,
        query: &MetricQuery,
        instance_name: Option<&str>,
    ) -> Result<MetricsResponse> {
        let session = self.session(instance_name)?;
        self.metrics.query_resource_metrics(&session, query).await
    }

    /// Best-effort: an unknown instance or any upstream failure yields an empty list
    pub async fn get_available_metrics(
        &self,
        resource_id: &str,
        instance_name: Option<&str>,
    ) -> StatKeyList {
        match self.session(instance_name) {
            Ok(session) => {
                self.metrics
                    .get_available_metrics(&session, resource_id)
                    .await
            }
            Err(e) => {
                warn!("Could not list stat keys for resource '{}': {}", resource_id, e);
                StatKeyList::empty()
            }
        }
    }

    pub async fn search_resources(
        &self,
        filter: SearchFilter<'_>,
        instance_name: Option<&str>,
    ) -> Result<ResourceList> {
        let session = self.session(instance_name)?;
        self.resources.search_resources(&session, filter).await
    }

    /// Structured query where every condition must hold
    pub async fn query_resources(
        &self,
        conditions: Vec<PropertyCondition>,
        instance_name: Option<&str>,
    ) -> Result<ResourceList> {
        let session = self.session(instance_name)?;
        self.resources
            .query_resources(&session, conditions, ConjunctionOperator::And)
            .await
    }

    pub async fn query_project_resources(
        &self,
        filter: KindFilter,
        instance_name: Option<&str>,
    ) -> Result<ResourceList> {
        let session = self.session(instance_name)?;
        self.resources
            .query_project_resources(&session, filter)
            .await
    }

    pub async fn query_cluster_resources(
        &self,
        filter: KindFilter,
        instance_name: Option<&str>,
    ) -> Result<ResourceList> {
        let session = self.session(instance_name)?;
        self.resources
            .query_cluster_resources(&session, filter)
            .await
    }

    /// Best-effort name lookup; never fails
    pub async fn find_resource_by_name(
        &self,
        name: &str,
        instance_name: Option<&str>,
        resource_type: Option<ResourceType>,
    ) -> Option<Resource> {
        let session = match self.session(instance_name) {
            Ok(session) => session,
            Err(e) => {
                warn!("Lookup of resource '{}' skipped: {}", name, e);
                return None;
            }
        };

        self.resources
            .find_resource_by_name(&session, name, resource_type)
            .await
    }

    /// Best-effort property lookup; never fails
    pub async fn find_resource_by_property(
        &self,
        property_key: &str,
        property_value: &str,
        instance_name: Option<&str>,
    ) -> Option<Resource> {
        let session = match self.session(instance_name) {
            Ok(session) => session,
            Err(e) => {
                warn!(
                    "Lookup of resource with {} = '{}' skipped: {}",
                    property_key, property_value, e
                );
                return None;
            }
        };

        self.resources
            .find_resource_by_property(&session, property_key, property_value)
            .await
    }

    pub async fn get_resource_details(
        &self,
        resource_id: &str,
        instance_name: Option<&str>,
    ) -> Result<Resource> {
        let session = self.session(instance_name)?;
        self.resources
            .get_resource_details(&session, resource_id)
            .await
    }
}
