//! Per-instance session token slots
//!
//! A slot holds at most one cached token. Reads go through `ArcSwapOption`
//! and never lock. Acquisition is single-flight: the first caller to find the
//! slot empty starts the credential exchange as a shared future, and every
//! concurrent caller awaits that same future and receives the same token or
//! the same error.

use crate::error::Result;
use arc_swap::ArcSwapOption;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Session token obtained from an instance's token endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
    pub value: String,
    pub instance_name: String,
    /// Upstream-reported validity (epoch millis), informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("value", &"[REDACTED]")
            .field("instance_name", &self.instance_name)
            .field("validity", &self.validity)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub(crate) type TokenFuture = BoxFuture<'static, Result<Arc<CachedToken>>>;

struct InFlight {
    generation: u64,
    future: Shared<TokenFuture>,
}

#[derive(Default)]
struct FlightState {
    current: Option<InFlight>,
    next_generation: u64,
}

/// Token slot for one instance
#[derive(Default)]
pub struct TokenSlot {
    token: ArcSwapOption<CachedToken>,
    flight: Mutex<FlightState>,
}

impl TokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token, if any
    pub fn cached(&self) -> Option<Arc<CachedToken>> {
        self.token.load_full()
    }

    /// Return the cached token or join/start a single acquisition
    pub async fn get_or_acquire<F>(&self, acquire: F) -> Result<Arc<CachedToken>>
    where
        F: FnOnce() -> TokenFuture,
    {
        if let Some(token) = self.token.load_full() {
            return Ok(token);
        }

        let (generation, future) = {
            let mut state = self.flight.lock().unwrap_or_else(PoisonError::into_inner);

            // Another flight may have finished between the fast path and the lock
            if let Some(token) = self.token.load_full() {
                return Ok(token);
            }

            match state.current {
                Some(ref flight) => (flight.generation, flight.future.clone()),
                None => {
                    let generation = state.next_generation;
                    state.next_generation += 1;
                    let future = acquire().shared();
                    state.current = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    (generation, future)
                }
            }
        };

        let result = future.await;

        {
            let mut state = self.flight.lock().unwrap_or_else(PoisonError::into_inner);
            let owns_flight = state
                .current
                .as_ref()
                .map_or(false, |flight| flight.generation == generation);

            if owns_flight {
                if let Ok(ref token) = result {
                    self.token.store(Some(Arc::clone(token)));
                }
                state.current = None;
            }
        }

        result
    }

    /// Drop the cached token if it is still `stale`; returns whether it was removed
    pub fn invalidate(&self, stale: &CachedToken) -> bool {
        let previous = self.token.rcu(|current| match current {
            Some(token) if token.value == stale.value => None,
            other => other.clone(),
        });
        matches!(previous, Some(ref token) if token.value == stale.value)
    }

    /// Unconditionally drop the cached token
    pub fn clear(&self) -> bool {
        self.token.swap(None).is_some()
    }
}
