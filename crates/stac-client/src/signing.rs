//! Planetary Computer shared-access-signature signing.
//!
//! Blob storage behind the Planetary Computer only serves requests carrying a
//! SAS token. Tokens are per collection, valid for about an hour, and are
//! cached here so concurrent requests share one token until it nears expiry.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use ndvi_common::SignedHref;

use crate::error::{StacError, StacResult};
use crate::models::TokenResponse;
use crate::retry::{send_with_retry, RetryPolicy};

/// Default Planetary Computer SAS API base URL.
pub const PC_SAS_URL: &str = "https://planetarycomputer.microsoft.com/api/sas/v1";

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Fetches and caches SAS tokens, and appends them to asset hrefs.
pub struct SasSigner {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    /// Tokens expiring within this margin are refreshed
    refresh_margin: chrono::Duration,
    cache: RwLock<HashMap<String, CachedToken>>,
}

impl SasSigner {
    pub fn new(client: Client, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
            refresh_margin: chrono::Duration::minutes(5),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin =
            chrono::Duration::from_std(margin).unwrap_or_else(|_| chrono::Duration::minutes(5));
        self
    }

    /// Sign `href` with the current token for `collection`.
    pub async fn sign(&self, collection: &str, href: &str) -> StacResult<SignedHref> {
        let token = self.token_for(collection).await?;
        Ok(SignedHref::new(
            append_token(href, &token.token),
            Some(token.expires_at),
        ))
    }

    /// Cached token for `collection`, fetching a fresh one when missing or
    /// about to expire.
    async fn token_for(&self, collection: &str) -> StacResult<CachedToken> {
        let now = Utc::now();
        {
            let cache = self.cache.read().await;
            if let Some(tok) = cache.get(collection) {
                if tok.expires_at - self.refresh_margin > now {
                    return Ok(tok.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(tok) = cache.get(collection) {
            if tok.expires_at - self.refresh_margin > now {
                return Ok(tok.clone());
            }
        }

        let fresh = self.fetch_token(collection).await?;
        cache.insert(collection.to_string(), fresh.clone());
        Ok(fresh)
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_token(&self, collection: &str) -> StacResult<CachedToken> {
        let url = format!("{}/token/{}", self.base_url, collection);
        debug!(url = %url, "Fetching SAS token");

        let resp = send_with_retry(&self.retry, "SAS token", || self.client.get(&url))
            .await
            .map_err(|e| StacError::Signing(e.to_string()))?;
        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| StacError::Signing(format!("parsing token response: {}", e)))?;

        if body.token.is_empty() {
            return Err(StacError::Signing(format!(
                "empty token returned for collection {}",
                collection
            )));
        }

        info!(
            collection = %collection,
            expires_at = %body.expiry,
            "Obtained SAS token"
        );

        Ok(CachedToken {
            token: body.token,
            expires_at: body.expiry,
        })
    }
}

/// Append a query-string token to a URL.
pub fn append_token(href: &str, token: &str) -> String {
    let token = token.trim_start_matches('?');
    if href.contains('?') {
        format!("{}&{}", href, token)
    } else {
        format!("{}?{}", href, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_token() {
        assert_eq!(
            append_token("https://a/b.tif", "st=1&sig=x"),
            "https://a/b.tif?st=1&sig=x"
        );
        assert_eq!(
            append_token("https://a/b.tif?v=2", "?st=1&sig=x"),
            "https://a/b.tif?v=2&st=1&sig=x"
        );
    }
}
