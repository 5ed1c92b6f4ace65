//! Bearer-token cache for the reasoning provider.
//!
//! The cached token is process-wide: every conversation shares one client.
//! Refresh happens under the cache lock, so concurrent callers that all see an
//! expired token wait for a single refresh instead of racing.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::LlmError;

/// Seconds shaved off the provider-declared lifetime so a token is never used
/// right at its expiry edge.
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// An opaque bearer token plus the instant after which it must not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Builds a token from a provider-declared lifetime, applying the safety margin.
    /// Fails with `LlmError::Auth` if the expiry instant is not representable.
    pub fn with_lifetime(
        value: String,
        issued_at: DateTime<Utc>,
        lifetime_secs: i64,
    ) -> Result<Self, LlmError> {
        let expires_at = lifetime_secs
            .checked_sub(SAFETY_MARGIN_SECS)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| LlmError::Auth {
                status: 0,
                message: format!("token lifetime out of range: {lifetime_secs}s"),
            })?;
        Ok(Self { value, expires_at })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Clone, Default)]
pub struct TokenCache {
    slot: Arc<Mutex<Option<AccessToken>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token if it is still valid at `now`, otherwise runs
    /// `refresh` exactly once and caches its result.
    ///
    /// A failed refresh leaves the cache empty so the next call tries again.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        now: DateTime<Utc>,
        refresh: F,
    ) -> Result<String, LlmError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, LlmError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if !token.is_expired_at(now) {
                return Ok(token.value.clone());
            }
        }

        *slot = None;
        let token = refresh().await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    /// Drops the cached token, forcing the next caller to re-authenticate.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    #[cfg(test)]
    pub async fn current(&self) -> Option<AccessToken> {
        self.slot.lock().await.clone()
    }
}
