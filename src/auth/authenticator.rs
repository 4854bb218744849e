//! Credential exchange and token reuse
//!
//! One [`TokenSlot`] per configured instance. Tokens are acquired lazily on
//! first use, reused until a caller reports them stale, and never persisted.

use crate::clients::{ApiRequest, SuiteApiClient};
use crate::error::{MetricsError, Result};
use crate::registry::Instance;
use futures_util::future::FutureExt;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::token_cache::{CachedToken, TokenSlot};

/// Body of a successful `POST /auth/token/acquire`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token: String,
    #[serde(default)]
    validity: Option<i64>,
    #[serde(default)]
    expires_at: Option<String>,
}

/// Exchanges instance credentials for session tokens and caches them
pub struct Authenticator {
    api: Arc<SuiteApiClient>,
    slots: HashMap<String, TokenSlot>,
    acquisitions: Arc<AtomicU64>,
}

impl Authenticator {
    /// Create an authenticator with one empty slot per instance name
    pub fn new<'a, I>(api: Arc<SuiteApiClient>, instance_names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let slots = instance_names
            .into_iter()
            .map(|name| (name.to_string(), TokenSlot::new()))
            .collect();

        Self {
            api,
            slots,
            acquisitions: Arc::new(AtomicU64::new(0)),
        }
    }

    fn slot(&self, instance_name: &str) -> Result<&TokenSlot> {
        self.slots
            .get(instance_name)
            .ok_or_else(|| MetricsError::instance_not_found(instance_name))
    }

    /// Cached token for an instance, acquiring one if needed
    pub async fn get_token(&self, instance: &Arc<Instance>) -> Result<Arc<CachedToken>> {
        let slot = self.slot(&instance.name)?;

        if let Some(token) = slot.cached() {
            debug!("Reusing cached token for instance '{}'", instance.name);
            return Ok(token);
        }

        let api = Arc::clone(&self.api);
        let instance = Arc::clone(instance);
        let acquisitions = Arc::clone(&self.acquisitions);

        slot.get_or_acquire(move || {
            async move {
                acquisitions.fetch_add(1, Ordering::Relaxed);
                exchange_credentials(&api, &instance).await.map(Arc::new)
            }
            .boxed()
        })
        .await
    }

    /// Drop `stale` from the cache so the next caller re-authenticates
    ///
    /// A newer token already cached by another caller is left alone.
    pub fn invalidate(&self, stale: &CachedToken) -> bool {
        match self.slots.get(&stale.instance_name) {
            Some(slot) => {
                let removed = slot.invalidate(stale);
                if removed {
                    warn!("Invalidated session token for instance '{}'", stale.instance_name);
                }
                removed
            }
            None => false,
        }
    }

    /// Drop whatever token is cached for an instance
    pub fn invalidate_instance(&self, instance_name: &str) -> Result<bool> {
        let removed = self.slot(instance_name)?.clear();
        if removed {
            info!("Cleared session token for instance '{}'", instance_name);
        }
        Ok(removed)
    }

    pub fn cached_token(&self, instance_name: &str) -> Option<Arc<CachedToken>> {
        self.slots.get(instance_name).and_then(|slot| slot.cached())
    }

    /// Number of credential exchanges attempted since construction
    pub fn acquisition_count(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

async fn exchange_credentials(api: &SuiteApiClient, instance: &Instance) -> Result<CachedToken> {
    info!(
        "Acquiring session token for instance '{}' as '{}'",
        instance.name, instance.credentials.username
    );

    let request = ApiRequest::post(
        ["auth", "token", "acquire"],
        json!({
            "username": instance.credentials.username,
            "password": instance.credentials.password(),
        }),
    );

    let response: TokenResponse = api
        .send(instance, &request, None)
        .await
        .map_err(|e| into_auth_error(&instance.name, e))?;

    if response.token.is_empty() {
        return Err(MetricsError::auth(
            instance.name.as_str(),
            None,
            "token endpoint returned an empty token",
        ));
    }

    Ok(CachedToken {
        value: response.token,
        instance_name: instance.name.clone(),
        validity: response.validity,
        expires_at: response.expires_at,
    })
}

fn into_auth_error(instance: &str, error: MetricsError) -> MetricsError {
    match error {
        MetricsError::Upstream {
            instance, status, message,
        } => MetricsError::Auth {
            instance,
            status: Some(status),
            message,
        },
        MetricsError::Http(e) => MetricsError::auth(instance, e.status().map(|s| s.as_u16()), e.to_string()),
        MetricsError::Serde(e) => {
            MetricsError::auth(instance, None, format!("malformed token response: {}", e))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_failure_becomes_auth_error() {
        let err = into_auth_error(
            "vcfo-1",
            MetricsError::upstream("vcfo-1", 401, "invalid credentials"),
        );
        match err {
            MetricsError::Auth { instance, status, message } => {
                assert_eq!(instance, "vcfo-1");
                assert_eq!(status, Some(401));
                assert_eq!(message, "invalid credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_token_response_fields() {
        let response: TokenResponse = serde_json::from_value(json!({
            "token": "abc::def",
            "validity": 1700000000000i64,
            "expiresAt": "Tuesday, November 14, 2023",
            "roles": []
        }))
        .unwrap();
        assert_eq!(response.token, "abc::def");
        assert_eq!(response.validity, Some(1700000000000));
    }

    #[tokio::test]
    async fn test_unknown_instance_has_no_slot() {
        let api = Arc::new(SuiteApiClient::new(&crate::config::HttpConfig::default()).unwrap());
        let auth = Authenticator::new(api, ["vcfo-1"]);
        assert!(auth.cached_token("vcfo-2").is_none());
        assert!(auth.invalidate_instance("vcfo-2").is_err());
        assert_eq!(auth.acquisition_count(), 0);
    }
}
