//! Resource inventory types and the resource-kind table

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Upstream identity of a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_kind_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_kind_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Opaque upstream resource; everything beyond the identity is passed through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_key: Option<ResourceKey>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    pub fn name(&self) -> Option<&str> {
        self.resource_key.as_ref()?.name.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList {
    #[serde(default)]
    pub resource_list: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<Value>,
}

impl ResourceList {
    pub fn into_first(self) -> Option<Resource> {
        self.resource_list.into_iter().next()
    }
}

/// Comparison applied by a property condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    Eq,
    NotEq,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    NotRegex,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConjunctionOperator {
    #[default]
    And,
    Or,
}

/// A single property filter, sent upstream as `{key, operator, stringValue}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCondition {
    pub key: String,
    pub operator: ConditionOperator,
    #[serde(rename = "stringValue", alias = "value")]
    pub value: String,
}

impl PropertyCondition {
    pub fn eq<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            operator: ConditionOperator::Eq,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyConditions {
    pub conjunction_operator: ConjunctionOperator,
    pub conditions: Vec<PropertyCondition>,
}

/// Body of `POST /resources/query`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adapter_kind: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_kind: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_conditions: Option<PropertyConditions>,
}

impl ResourceQuery {
    pub fn with_conditions(
        conjunction_operator: ConjunctionOperator,
        conditions: Vec<PropertyCondition>,
    ) -> Self {
        Self {
            property_conditions: Some(PropertyConditions {
                conjunction_operator,
                conditions,
            }),
            ..Default::default()
        }
    }
}

/// Caller filter for kind-specific queries; empty kind arrays fall back to the kind's defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindFilter {
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub adapter_kind: Vec<String>,
    #[serde(default)]
    pub resource_kind: Vec<String>,
}

impl KindFilter {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: vec![name.into()],
            ..Default::default()
        }
    }
}

/// Resource categories with a dedicated lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Project,
    Vm,
    Cluster,
    SupervisorNamespace,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Project,
        ResourceType::Vm,
        ResourceType::Cluster,
        ResourceType::SupervisorNamespace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Project => "project",
            ResourceType::Vm => "vm",
            ResourceType::Cluster => "cluster",
            ResourceType::SupervisorNamespace => "supervisor-namespace",
        }
    }

    /// Lookup profile for this kind
    pub fn profile(&self) -> &'static KindProfile {
        KIND_TABLE
            .iter()
            .find(|profile| profile.resource_type == Some(*self))
            .unwrap_or(&GENERAL_PROFILE)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown resource type '{}'. Expected one of: project, vm, cluster, supervisor-namespace",
                    s
                )
            })
    }
}

/// How a name lookup is resolved upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// `POST /resources/query` with name and kind filters
    StructuredQuery,
    /// `GET /resources?name=...`
    FreeTextSearch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindProfile {
    pub resource_type: Option<ResourceType>,
    pub strategy: ResolveStrategy,
    pub adapter_kinds: &'static [&'static str],
    pub resource_kinds: &'static [&'static str],
}

impl KindProfile {
    /// Lookup profile for an optional kind; no kind means a general free-text search
    pub fn for_type(resource_type: Option<ResourceType>) -> &'static KindProfile {
        match resource_type {
            Some(resource_type) => resource_type.profile(),
            None => &GENERAL_PROFILE,
        }
    }

    /// Structured query for this kind; caller-supplied kind arrays take precedence
    pub fn build_query(&self, filter: KindFilter) -> ResourceQuery {
        let defaults =
            |values: &[&str]| -> Vec<String> { values.iter().map(|v| v.to_string()).collect() };

        ResourceQuery {
            adapter_kind: if filter.adapter_kind.is_empty() {
                defaults(self.adapter_kinds)
            } else {
                filter.adapter_kind
            },
            resource_kind: if filter.resource_kind.is_empty() {
                defaults(self.resource_kinds)
            } else {
                filter.resource_kind
            },
            name: filter.name,
            property_conditions: None,
        }
    }
}

static GENERAL_PROFILE: KindProfile = KindProfile {
    resource_type: None,
    strategy: ResolveStrategy::FreeTextSearch,
    adapter_kinds: &[],
    resource_kinds: &[],
};

static KIND_TABLE: [KindProfile; 4] = [
    KindProfile {
        resource_type: Some(ResourceType::Project),
        strategy: ResolveStrategy::StructuredQuery,
        adapter_kinds: &["VCFAutomation"],
        resource_kinds: &["Project"],
    },
    KindProfile {
        resource_type: Some(ResourceType::Cluster),
        strategy: ResolveStrategy::StructuredQuery,
        adapter_kinds: &["VMWARE"],
        resource_kinds: &["ClusterComputeResource"],
    },
    KindProfile {
        resource_type: Some(ResourceType::SupervisorNamespace),
        strategy: ResolveStrategy::StructuredQuery,
        adapter_kinds: &["VMWARE"],
        resource_kinds: &["Namespace"],
    },
    // Plain name search, same as an untyped lookup
    KindProfile {
        resource_type: Some(ResourceType::Vm),
        strategy: ResolveStrategy::FreeTextSearch,
        adapter_kinds: &[],
        resource_kinds: &[],
    },
];
