//! Resource inventory lookups

pub mod resolver;
pub mod types;

pub use resolver::{ResourceResolver, SearchFilter};
pub use types::{
    ConditionOperator, ConjunctionOperator, KindFilter, KindProfile, PropertyCondition,
    PropertyConditions, ResolveStrategy, Resource, ResourceKey, ResourceList, ResourceQuery,
    ResourceType,
};
