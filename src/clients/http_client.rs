//! Suite API HTTP client
//!
//! Thin wrapper around a pooled `reqwest::Client` that addresses the
//! `{baseUrl}/suite-api/api/...` surface of a monitoring instance, attaches
//! the bearer token, and turns non-success statuses into [`MetricsError::Upstream`].

use crate::config::HttpConfig;
use crate::error::{MetricsError, Result};
use crate::registry::Instance;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Path segments between the instance base URL and every endpoint
const API_PREFIX: [&str; 2] = ["suite-api", "api"];

/// Upper bound on how much of an error body is kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// One request against the suite API, reusable across retries
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I, body: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut request = Self::new(Method::POST, segments);
        request.body = Some(body);
        request
    }

    /// Append a query parameter; repeated keys are sent as repeated parameters
    pub fn query<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_opt<K: Into<String>, V: ToString>(self, key: K, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn query_all<K, I, V>(mut self, key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let key = key.into();
        for value in values {
            self.query.push((key.clone(), value.to_string()));
        }
        self
    }

    /// Path relative to the API prefix, for logging
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Query value for a key, first occurrence
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP client shared by every instance
#[derive(Debug, Clone)]
pub struct SuiteApiClient {
    http_client: Client,
    timeout: Duration,
}

impl SuiteApiClient {
    /// Create a new client with pooled connections and a bounded per-request timeout
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let http_client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(60))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MetricsError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL of an endpoint on an instance
    pub fn endpoint(&self, instance: &Instance, segments: &[String]) -> Result<Url> {
        let mut url = instance.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                MetricsError::config(format!(
                    "Instance '{}' baseUrl cannot be used as a base URL",
                    instance.name
                ))
            })?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Send a request and decode the JSON response body
    pub async fn send<T: DeserializeOwned>(
        &self,
        instance: &Instance,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<T> {
        let url = self.endpoint(instance, &request.segments)?;

        debug!(
            "Sending {} {} to instance '{}' ({} query params)",
            request.method,
            request.path(),
            instance.name,
            request.query.len()
        );

        let mut req_builder = self
            .http_client
            .request(request.method.clone(), url)
            .header("Accept", "application/json");

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            req_builder = req_builder.json(body);
        }
        if let Some(token) = token {
            req_builder = req_builder.bearer_auth(token);
        }

        let response = req_builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MetricsError::upstream(
                instance.name.as_str(),
                status.as_u16(),
                truncate(&error_text),
            ));
        }

        let response_text = response.text().await?;
        let body = if response_text.trim().is_empty() {
            // Some endpoints answer 204 / empty bodies; decode as JSON null
            "null"
        } else {
            response_text.as_str()
        };

        let decoded = serde_json::from_str(body)?;

        debug!(
            "Received {} from instance '{}' for {}",
            status,
            instance.name,
            request.path()
        );

        Ok(decoded)
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
