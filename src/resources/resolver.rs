//! Resource resolution
//!
//! Free-text search, structured property/kind queries, and the best-effort
//! "find one" lookups. The lookups never fail: upstream errors are logged
//! and reported as `None`.

use crate::clients::{ApiRequest, InstanceSession};
use crate::error::{MetricsError, Result};
use tracing::{debug, warn};

use super::types::{
    ConjunctionOperator, KindFilter, KindProfile, PropertyCondition, ResolveStrategy, Resource,
    ResourceList, ResourceQuery, ResourceType,
};

/// Optional filters for `GET /resources`
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchFilter<'a> {
    pub name: Option<&'a str>,
    pub adapter_kind: Option<&'a str>,
    pub resource_kind: Option<&'a str>,
}

impl<'a> SearchFilter<'a> {
    pub fn by_name(name: &'a str) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }

    pub fn to_request(&self) -> ApiRequest {
        ApiRequest::get(["resources"])
            .query_opt("name", self.name)
            .query_opt("adapterKind", self.adapter_kind)
            .query_opt("resourceKind", self.resource_kind)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceResolver;

impl ResourceResolver {
    pub fn new() -> Self {
        Self
    }

    pub async fn search_resources(
        &self,
        session: &InstanceSession<'_>,
        filter: SearchFilter<'_>,
    ) -> Result<ResourceList> {
        let list: Option<ResourceList> = session.send(&filter.to_request()).await?;
        Ok(list.unwrap_or_default())
    }

    /// `POST /resources/query` with an arbitrary structured body
    pub async fn query(
        &self,
        session: &InstanceSession<'_>,
        query: &ResourceQuery,
    ) -> Result<ResourceList> {
        let request = ApiRequest::post(["resources", "query"], serde_json::to_value(query)?);
        let list: Option<ResourceList> = session.send(&request).await?;
        Ok(list.unwrap_or_default())
    }

    /// Structured query over property conditions
    pub async fn query_resources(
        &self,
        session: &InstanceSession<'_>,
        conditions: Vec<PropertyCondition>,
        conjunction: ConjunctionOperator,
    ) -> Result<ResourceList> {
        if conditions.is_empty() {
            return Err(MetricsError::validation(
                "At least one property condition is required",
            ));
        }

        let query = ResourceQuery::with_conditions(conjunction, conditions);
        self.query(session, &query).await
    }

    /// Structured query scoped to one resource kind
    pub async fn query_kind_resources(
        &self,
        session: &InstanceSession<'_>,
        resource_type: ResourceType,
        filter: KindFilter,
    ) -> Result<ResourceList> {
        let query = resource_type.profile().build_query(filter);
        self.query(session, &query).await
    }

    pub async fn query_project_resources(
        &self,
        session: &InstanceSession<'_>,
        filter: KindFilter,
    ) -> Result<ResourceList> {
        self.query_kind_resources(session, ResourceType::Project, filter)
            .await
    }

    pub async fn query_cluster_resources(
        &self,
        session: &InstanceSession<'_>,
        filter: KindFilter,
    ) -> Result<ResourceList> {
        self.query_kind_resources(session, ResourceType::Cluster, filter)
            .await
    }

    /// First resource with this name, or `None` on a miss or any failure
    pub async fn find_resource_by_name(
        &self,
        session: &InstanceSession<'_>,
        name: &str,
        resource_type: Option<ResourceType>,
    ) -> Option<Resource> {
        let profile = KindProfile::for_type(resource_type);

        let outcome = match profile.strategy {
            ResolveStrategy::StructuredQuery => {
                let query = profile.build_query(KindFilter::named(name));
                self.query(session, &query).await
            }
            ResolveStrategy::FreeTextSearch => {
                self.search_resources(session, SearchFilter::by_name(name))
                    .await
            }
        };

        let kind = resource_type.map_or("any", |t| t.as_str());
        settle(outcome, session, || {
            format!("resource '{}' (type {})", name, kind)
        })
    }

    /// First resource whose property equals the value, or `None` on a miss or any failure
    pub async fn find_resource_by_property(
        &self,
        session: &InstanceSession<'_>,
        property_key: &str,
        property_value: &str,
    ) -> Option<Resource> {
        let outcome = self
            .query_resources(
                session,
                vec![PropertyCondition::eq(property_key, property_value)],
                ConjunctionOperator::And,
            )
            .await;

        settle(outcome, session, || {
            format!("resource with {} = '{}'", property_key, property_value)
        })
    }

    pub async fn get_resource_details(
        &self,
        session: &InstanceSession<'_>,
        resource_id: &str,
    ) -> Result<Resource> {
        if resource_id.trim().is_empty() {
            return Err(MetricsError::validation("resourceId cannot be empty"));
        }

        session
            .send(&ApiRequest::get(["resources", resource_id]))
            .await
    }
}

/// Collapse a lookup outcome to its first match, logging misses and failures
fn settle<F>(
    outcome: Result<ResourceList>,
    session: &InstanceSession<'_>,
    describe: F,
) -> Option<Resource>
where
    F: FnOnce() -> String,
{
    match outcome {
        Ok(list) => {
            let found = list.into_first();
            if found.is_none() {
                debug!(
                    "No match for {} on instance '{}'",
                    describe(),
                    session.instance().name
                );
            }
            found
        }
        Err(e) => {
            warn!(
                "Lookup of {} on instance '{}' failed: {}",
                describe(),
                session.instance().name,
                e
            );
            None
        }
    }
}
