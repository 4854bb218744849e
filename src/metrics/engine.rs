//! Metrics query engine
//!
//! Builds the stats requests (single resource, latest value, bulk query),
//! dispatches them through an [`InstanceSession`], and normalizes the answers.

use crate::clients::{ApiRequest, InstanceSession};
use crate::error::{MetricsError, Result};
use serde::Serialize;
use tracing::{debug, warn};

use super::interval::{IntervalPolicy, IntervalType};
use super::normalize::{normalize_stats, RawStatsResponse};
use super::types::{MetricQuery, MetricsResponse, RollUpType, StatKeyList};

/// Body of `POST /resources/stats/query`
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct StatsQueryBody<'a> {
    resource_id: &'a [String],
    stat_key: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    begin: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    roll_up_type: Option<RollUpType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval_type: Option<IntervalType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval_quantifier: Option<u32>,
}

/// Issues metric queries and normalizes responses
#[derive(Debug, Clone, Default)]
pub struct MetricsQueryEngine {
    policy: IntervalPolicy,
}

impl MetricsQueryEngine {
    pub fn new(policy: IntervalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IntervalPolicy {
        &self.policy
    }

    /// `GET /resources/stats` for one resource
    pub fn resource_stats_request(
        &self,
        resource_id: &str,
        stat_keys: &[String],
        begin: Option<i64>,
        end: Option<i64>,
        roll_up_type: Option<RollUpType>,
    ) -> ApiRequest {
        let interval = self.policy.select_window(begin, end);

        ApiRequest::get(["resources", "stats"])
            .query("resourceId", resource_id)
            .query_all("statKey", stat_keys)
            .query_opt("begin", begin)
            .query_opt("end", end)
            .query_opt("rollUpType", roll_up_type)
            .query_opt("intervalType", interval.map(|i| i.interval_type))
            .query_opt("intervalQuantifier", interval.and_then(|i| i.quantifier))
    }

    /// `GET /resources/stats/latest` for several resources, no time window
    pub fn latest_stats_request(&self, resource_ids: &[String], stat_keys: &[String]) -> ApiRequest {
        ApiRequest::get(["resources", "stats", "latest"])
            .query_all("resourceId", resource_ids)
            .query_all("statKey", stat_keys)
    }

    /// `POST /resources/stats/query`; an explicit interval on the query wins over the policy
    pub fn bulk_query_request(&self, query: &MetricQuery) -> Result<ApiRequest> {
        let (interval_type, interval_quantifier) = match query.interval_type {
            Some(interval_type) => (Some(interval_type), query.interval_quantifier),
            None => match self.policy.select_window(query.begin, query.end) {
                Some(interval) => (Some(interval.interval_type), interval.quantifier),
                None => (None, query.interval_quantifier),
            },
        };

        let body = StatsQueryBody {
            resource_id: &query.resource_ids,
            stat_key: &query.stat_keys,
            begin: query.begin,
            end: query.end,
            roll_up_type: query.roll_up_type,
            interval_type,
            interval_quantifier,
        };

        Ok(ApiRequest::post(
            ["resources", "stats", "query"],
            serde_json::to_value(&body)?,
        ))
    }

    pub async fn get_resource_metrics(
        &self,
        session: &InstanceSession<'_>,
        resource_id: &str,
        stat_keys: &[String],
        begin: Option<i64>,
        end: Option<i64>,
        roll_up_type: Option<RollUpType>,
    ) -> Result<MetricsResponse> {
        if resource_id.trim().is_empty() {
            return Err(MetricsError::validation("resourceId cannot be empty"));
        }

        let request = self.resource_stats_request(resource_id, stat_keys, begin, end, roll_up_type);
        self.fetch_stats(session, &request).await
    }

    pub async fn get_latest_resource_metrics(
        &self,
        session: &InstanceSession<'_>,
        resource_ids: &[String],
        stat_keys: &[String],
    ) -> Result<MetricsResponse> {
        if resource_ids.is_empty() {
            return Err(MetricsError::validation("At least one resourceId is required"));
        }

        let request = self.latest_stats_request(resource_ids, stat_keys);
        self.fetch_stats(session, &request).await
    }

    pub async fn query_resource_metrics(
        &self,
        session: &InstanceSession<'_>,
        query: &MetricQuery,
    ) -> Result<MetricsResponse> {
        if query.resource_ids.is_empty() {
            return Err(MetricsError::validation("At least one resourceId is required"));
        }

        let request = self.bulk_query_request(query)?;
        self.fetch_stats(session, &request).await
    }

    /// Best-effort listing of metric keys; any failure yields an empty list
    pub async fn get_available_metrics(
        &self,
        session: &InstanceSession<'_>,
        resource_id: &str,
    ) -> StatKeyList {
        let request = ApiRequest::get(["resources", resource_id, "statkeys"]);

        match session.send::<Option<StatKeyList>>(&request).await {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                warn!(
                    "Could not list stat keys for resource '{}' on instance '{}': {}",
                    resource_id,
                    session.instance().name,
                    e
                );
                StatKeyList::empty()
            }
        }
    }

    async fn fetch_stats(
        &self,
        session: &InstanceSession<'_>,
        request: &ApiRequest,
    ) -> Result<MetricsResponse> {
        let raw: Option<RawStatsResponse> = session.send(request).await?;

        let Some(raw) = raw else {
            return Ok(MetricsResponse::default());
        };

        let entries = raw.entry_count();
        let response = normalize_stats(raw);
        debug!(
            "Normalized {} stats entries into {} series from instance '{}'",
            entries,
            response.values.len(),
            session.instance().name
        );
        Ok(response)
    }
}
