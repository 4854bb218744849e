//! Time-series metrics: granularity selection, query building, normalization

pub mod engine;
pub mod interval;
pub mod normalize;
pub mod types;

pub use engine::MetricsQueryEngine;
pub use interval::{select_interval, Interval, IntervalPolicy, IntervalType};
pub use normalize::{normalize_stats, normalize_value, RawStatsResponse};
pub use types::{
    MetricQuery, MetricSeries, MetricsResponse, RollUpType, Stat, StatKey, StatKeyDescriptor,
    StatKeyList,
};
