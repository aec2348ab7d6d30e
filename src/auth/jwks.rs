// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing keys for Firebase ID tokens.
//!
//! Google publishes the keys as a JWK set and states how long to keep them in
//! `Cache-Control: max-age`. Keys are decoded once per fetch and held until
//! that deadline. An unknown `kid` triggers a refetch so a rotation on
//! Google's side is picked up early, but at most once per
//! [`MIN_REFETCH_INTERVAL`]; fetches are serialized, so concurrent misses
//! share one request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use jsonwebtoken::DecodingKey;
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use tokio::sync::{Mutex, RwLock};

use super::error::ProviderError;

/// Google's published signing keys for Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Used when the response carries no usable `max-age`.
const FALLBACK_TTL: Duration = Duration::from_secs(300);

/// Floor between fetches caused by an unknown `kid`.
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct JwksManager {
    url: String,
    fallback_ttl: Duration,
    min_refetch_interval: Duration,
    cache: Arc<RwLock<Option<KeyCache>>>,
    fetching: Arc<Mutex<()>>,
    client: reqwest::Client,
}

impl JwksManager {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            fallback_ttl: FALLBACK_TTL,
            min_refetch_interval: MIN_REFETCH_INTERVAL,
            cache: Arc::new(RwLock::new(None)),
            fetching: Arc::new(Mutex::new(())),
            client,
        }
    }

    /// TTL applied when Google does not say how long to cache.
    pub fn with_fallback_ttl(mut self, ttl: Duration) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    pub fn with_min_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decoding key for `kid`.
    ///
    /// An unknown `kid` rejects the token rather than reporting an outage,
    /// whether or not a refetch was attempted.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, ProviderError> {
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        let _fetching = self.fetching.lock().await;
        // Another miss may have refreshed while this one waited.
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }
        if self.fetched_within(self.min_refetch_interval).await {
            tracing::debug!(kid, "unknown kid, key set fetched recently");
            return Err(unknown_kid(kid));
        }

        tracing::debug!(kid, "signing key not cached, fetching JWKS");
        self.fetch().await?;
        self.cached_key(kid).await.ok_or_else(|| unknown_kid(kid))
    }

    /// Fetch the key set and replace the cache. Returns the number of usable
    /// keys.
    pub async fn refresh(&self) -> Result<usize, ProviderError> {
        let _fetching = self.fetching.lock().await;
        self.fetch().await
    }

    /// Callers hold `fetching`.
    async fn fetch(&self) -> Result<usize, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("JWKS fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "JWKS endpoint returned HTTP {status}"
            )));
        }

        let ttl = max_age(response.headers()).unwrap_or(self.fallback_ttl);
        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("JWKS body unreadable: {e}")))?;

        let keys = decode_keys(&set);
        let count = keys.len();
        let fetched_at = Instant::now();
        *self.cache.write().await = Some(KeyCache {
            keys,
            fetched_at,
            expires_at: fetched_at + ttl,
        });
        tracing::debug!(keys = count, ttl_secs = ttl.as_secs(), "JWKS refreshed");
        Ok(count)
    }

    /// Whether unexpired keys are held.
    pub async fn is_cached(&self) -> bool {
        self.cache
            .read()
            .await
            .as_ref()
            .is_some_and(|cache| cache.expires_at > Instant::now())
    }

    /// Unexpired keys fetched less than `interval` ago.
    async fn fetched_within(&self, interval: Duration) -> bool {
        self.cache.read().await.as_ref().is_some_and(|cache| {
            cache.expires_at > Instant::now() && cache.fetched_at.elapsed() < interval
        })
    }

    async fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
        let cache = self.cache.read().await;
        let cache = cache.as_ref().filter(|c| c.expires_at > Instant::now())?;
        cache.keys.get(kid).cloned()
    }
}

fn unknown_kid(kid: &str) -> ProviderError {
    ProviderError::Rejected(format!("no signing key with kid {kid}"))
}

/// RSA keys with a `kid`; anything else in the set is skipped.
fn decode_keys(set: &JwkSet) -> HashMap<String, DecodingKey> {
    set.keys
        .iter()
        .filter_map(|jwk| {
            let kid = jwk.common.key_id.clone()?;
            let AlgorithmParameters::RSA(rsa) = &jwk.algorithm else {
                tracing::debug!(%kid, "skipping non-RSA key");
                return None;
            };
            match DecodingKey::from_rsa_components(&rsa.n, &rsa.e) {
                Ok(key) => Some((kid, key)),
                Err(e) => {
                    tracing::warn!(%kid, error = %e, "skipping unusable RSA key");
                    None
                }
            }
        })
        .collect()
}

fn max_age(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(CACHE_CONTROL)?
        .to_str()
        .ok()?
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.parse::<u64>().ok())
        .map(Duration::from_secs)
}
