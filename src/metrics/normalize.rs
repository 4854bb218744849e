//! Normalization of upstream stats responses
//!
//! The stats endpoints answer with one of two encodings per resource entry:
//!
//! - `{"resourceId": .., "stat": {..}}`: already canonical
//! - `{"resourceId": .., "stat-list": {"stat": [{..}, ..]}}`: several series in one entry
//!
//! Both are flattened into [`MetricSeries`]. Entries matching neither shape are dropped.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::{MetricSeries, MetricsResponse, Stat};

#[derive(Debug, Deserialize)]
struct StatList {
    #[serde(default)]
    stat: Vec<Stat>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatsEntry {
    Single {
        #[serde(rename = "resourceId")]
        resource_id: String,
        stat: Stat,
    },
    Listed {
        #[serde(rename = "resourceId")]
        resource_id: String,
        #[serde(rename = "stat-list")]
        stat_list: StatList,
    },
    Unrecognized(Value),
}

/// Raw upstream stats payload
#[derive(Debug, Deserialize)]
pub struct RawStatsResponse {
    #[serde(default)]
    values: Vec<StatsEntry>,
}

impl RawStatsResponse {
    /// Number of upstream entries before normalization
    pub fn entry_count(&self) -> usize {
        self.values.len()
    }
}

/// Flatten every entry into canonical series, preserving upstream order
pub fn normalize_stats(raw: RawStatsResponse) -> MetricsResponse {
    let mut values = Vec::with_capacity(raw.values.len());

    for entry in raw.values {
        match entry {
            StatsEntry::Single { resource_id, stat } => {
                values.push(MetricSeries { resource_id, stat });
            }
            StatsEntry::Listed {
                resource_id,
                stat_list,
            } => {
                values.extend(stat_list.stat.into_iter().map(|stat| MetricSeries {
                    resource_id: resource_id.clone(),
                    stat,
                }));
            }
            StatsEntry::Unrecognized(value) => {
                debug!(
                    "Dropping stats entry with neither 'stat' nor 'stat-list': {}",
                    value
                );
            }
        }
    }

    MetricsResponse { values }
}

/// Normalize an already-parsed JSON document
pub fn normalize_value(value: Value) -> serde_json::Result<MetricsResponse> {
    let raw: RawStatsResponse = serde_json::from_value(value)?;
    Ok(normalize_stats(raw))
}
