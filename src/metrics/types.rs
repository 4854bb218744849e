//! Metric query and series types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::interval::IntervalType;

/// Roll-up applied upstream when bucketing samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RollUpType {
    Avg,
    Sum,
    Min,
    Max,
    None,
    Latest,
    Count,
}

impl RollUpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollUpType::Avg => "AVG",
            RollUpType::Sum => "SUM",
            RollUpType::Min => "MIN",
            RollUpType::Max => "MAX",
            RollUpType::None => "NONE",
            RollUpType::Latest => "LATEST",
            RollUpType::Count => "COUNT",
        }
    }
}

impl fmt::Display for RollUpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RollUpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AVG" => Ok(RollUpType::Avg),
            "SUM" => Ok(RollUpType::Sum),
            "MIN" => Ok(RollUpType::Min),
            "MAX" => Ok(RollUpType::Max),
            "NONE" => Ok(RollUpType::None),
            "LATEST" => Ok(RollUpType::Latest),
            "COUNT" => Ok(RollUpType::Count),
            other => Err(format!(
                "unknown roll-up type '{}' (expected AVG, SUM, MIN, MAX, NONE, LATEST, COUNT)",
                other
            )),
        }
    }
}

/// Multi-resource, multi-key metrics query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricQuery {
    pub resource_ids: Vec<String>,
    pub stat_keys: Vec<String>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<i64>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_up_type: Option<RollUpType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_quantifier: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_type: Option<IntervalType>,
}

impl MetricQuery {
    pub fn new(resource_ids: Vec<String>, stat_keys: Vec<String>) -> Self {
        Self {
            resource_ids,
            stat_keys,
            ..Default::default()
        }
    }

    pub fn with_window(mut self, begin: i64, end: i64) -> Self {
        self.begin = Some(begin);
        self.end = Some(end);
        self
    }

    pub fn with_roll_up(mut self, roll_up_type: RollUpType) -> Self {
        self.roll_up_type = Some(roll_up_type);
        self
    }
}

/// Metric key reference, `{"key": "cpu|usage_average"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatKey {
    pub key: String,
}

/// One time series; `timestamps` and `data` are parallel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub stat_key: StatKey,
    #[serde(default)]
    pub timestamps: Vec<i64>,
    #[serde(default)]
    pub data: Vec<f64>,
    /// Additional upstream fields (rollUpType, intervalUnit, ...) kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical series shape returned by every metrics operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub resource_id: String,
    pub stat: Stat,
}

/// Result of a metrics operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub values: Vec<MetricSeries>,
}

/// Metric key available on a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatKeyDescriptor {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the available-metrics discovery call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatKeyList {
    #[serde(rename = "stat-key", default)]
    pub stat_key: Vec<StatKeyDescriptor>,
}

impl StatKeyList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stat_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roll_up_parse_and_serialize() {
        assert_eq!("avg".parse::<RollUpType>().unwrap(), RollUpType::Avg);
        assert!("median".parse::<RollUpType>().is_err());
        assert_eq!(serde_json::to_value(RollUpType::Latest).unwrap(), json!("LATEST"));
    }

    #[test]
    fn test_metric_query_camel_case() {
        let query: MetricQuery = serde_json::from_value(json!({
            "resourceIds": ["r1"],
            "statKeys": ["cpu|usage_average"],
            "begin": 1000,
            "rollUpType": "MAX"
        }))
        .unwrap();
        assert_eq!(query.resource_ids, vec!["r1"]);
        assert_eq!(query.begin, Some(1000));
        assert_eq!(query.end, None);
        assert_eq!(query.roll_up_type, Some(RollUpType::Max));
    }

    #[test]
    fn test_stat_key_list_field_name() {
        let list: StatKeyList = serde_json::from_value(json!({
            "stat-key": [{"key": "cpu|usage_average", "name": "Usage", "unit": "%"}]
        }))
        .unwrap();
        assert_eq!(list.stat_key.len(), 1);
        assert_eq!(list.stat_key[0].extra.get("unit"), Some(&json!("%")));

        let empty = serde_json::to_value(StatKeyList::empty()).unwrap();
        assert_eq!(empty, json!({"stat-key": []}));
    }
}
