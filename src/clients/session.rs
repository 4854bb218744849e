//! Authenticated dispatch against one instance
//!
//! Every authenticated call obtains a token, sends, and on HTTP 401
//! invalidates that token and retries exactly once before surfacing the error.

use crate::auth::Authenticator;
use crate::error::Result;
use crate::registry::Instance;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

use super::http_client::{ApiRequest, SuiteApiClient};

/// An instance bound to the shared HTTP client and authenticator
pub struct InstanceSession<'a> {
    instance: Arc<Instance>,
    api: &'a SuiteApiClient,
    auth: &'a Authenticator,
}

impl<'a> InstanceSession<'a> {
    pub fn new(instance: Arc<Instance>, api: &'a SuiteApiClient, auth: &'a Authenticator) -> Self {
        Self { instance, api, auth }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Send with the cached token, re-authenticating once on 401
    pub async fn send<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let token = self.auth.get_token(&self.instance).await?;

        match self.api.send(&self.instance, request, Some(&token.value)).await {
            Err(e) if e.is_unauthorized() => {
                warn!(
                    "Instance '{}' rejected session token for {}; re-authenticating",
                    self.instance.name,
                    request.path()
                );
                self.auth.invalidate(&token);
                let token = self.auth.get_token(&self.instance).await?;
                self.api.send(&self.instance, request, Some(&token.value)).await
            }
            other => other,
        }
    }
}
