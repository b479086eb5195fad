use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::token::Token;
use crate::config::credentials::IssuerConfig;
use crate::error::Result;
use crate::helpers::time::{Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::signer::{Signer, TokenIssuer};

/// A token is renewed once fewer than this many seconds remain before `exp`.
pub const REFRESH_MARGIN_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
struct CacheEntry {
    token: Token,
    /// absolute expiry, equal to the token's `exp` claim
    expires_at: u64,
}

impl CacheEntry {
    fn new(token: Token) -> Self {
        let expires_at = token.exp_unix_ts;
        Self { token, expires_at }
    }

    fn is_fresh(&self, now: u64) -> bool {
        now.saturating_add(REFRESH_MARGIN_SECONDS) < self.expires_at
    }
}

/// Single-slot cache in front of a [`TokenIssuer`].
///
/// `get` holds the slot lock across check and re-sign, so concurrent callers
/// that find the entry stale trigger one signing operation between them.
pub struct TokenCache {
    issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<CacheEntry>>,
}

impl TokenCache {
    pub fn new(issuer: Arc<dyn TokenIssuer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            issuer,
            clock,
            slot: Mutex::new(None),
        }
    }

    /// Cache backed by a [`Signer`] for `config` and the system clock.
    pub fn from_config(config: &IssuerConfig) -> Self {
        Self::new(Arc::new(Signer::new(config)), Arc::new(SystemClock))
    }

    /// Return a token valid for at least [`REFRESH_MARGIN_SECONDS`], signing
    /// a new one when the slot is empty or the cached token is about to expire.
    pub async fn get(&self) -> Result<Token> {
        let metrics = get_metrics().await;
        let mut slot = self.slot.lock().await;
        let now = self.clock.now_unix();

        if let Some(entry) = slot.as_ref() {
            if entry.is_fresh(now) {
                metrics.token_cache_hits.inc();
                debug!(
                    "serving cached token, {} seconds left",
                    entry.token.remaining_seconds(now)
                );
                return Ok(entry.token.clone());
            }
            info!(
                "cached token expires at {}, renewing ({} seconds left)",
                entry.expires_at,
                entry.token.remaining_seconds(now)
            );
        }
        *slot = None;

        let token = self.issuer.issue_at(now).inspect_err(|e| {
            warn!("token issuance failed: {}", e);
            metrics.credential_failures.with_label_values(&[e.reason()]).inc();
        })?;

        metrics.tokens_issued.inc();
        metrics.token_expiry_unix.set(token.exp_unix_ts as i64);
        *slot = Some(CacheEntry::new(token.clone()));
        Ok(token)
    }

    /// Forget the cached token; the next `get` signs a new one.
    pub async fn reset(&self) {
        let metrics = get_metrics().await;
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            info!("token cache cleared");
        }
        metrics.token_cache_resets.inc();
    }

    /// Currently cached token, if any, without refreshing it.
    pub async fn peek(&self) -> Option<Token> {
        self.slot.lock().await.as_ref().map(|entry| entry.token.clone())
    }
}
