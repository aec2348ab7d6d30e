// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory identity provider.
//!
//! Tokens are opaque strings mapped to a uid; users live in a map. Backs
//! `AppState::default()` and the test suite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::claims::{IdentityRecord, VerifiedToken};
use super::error::ProviderError;
use super::provider::IdentityProvider;

#[derive(Default)]
pub struct InMemoryIdentityProvider {
    tokens: RwLock<HashMap<String, String>>,
    users: RwLock<HashMap<String, IdentityRecord>>,
    verify_calls: AtomicUsize,
    unavailable: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a user.
    pub async fn insert_user(&self, user: IdentityRecord) {
        self.users.write().await.insert(user.uid.clone(), user);
    }

    /// Make `token` verify as `uid`.
    pub async fn issue_token(&self, token: impl Into<String>, uid: impl Into<String>) {
        self.tokens.write().await.insert(token.into(), uid.into());
    }

    /// Drop a user while leaving its tokens valid.
    pub async fn remove_user(&self, uid: &str) {
        self.users.write().await.remove(uid);
    }

    /// Number of `verify_id_token` calls seen so far.
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Simulate a provider outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call, to exercise timeouts.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    async fn simulate_network(&self) -> Result<(), ProviderError> {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, ProviderError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_network().await?;

        let uid = self
            .tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected("unknown token".to_string()))?;

        let now = chrono::Utc::now().timestamp();
        Ok(VerifiedToken {
            uid,
            issued_at: now,
            expires_at: now + 3600,
        })
    }

    async fn get_user(&self, uid: &str) -> Result<IdentityRecord, ProviderError> {
        self.simulate_network().await?;
        self.users
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: Map<String, Value>,
    ) -> Result<(), ProviderError> {
        self.simulate_network().await?;
        let mut users = self.users.write().await;
        let user = users.get_mut(uid).ok_or(ProviderError::NotFound)?;
        user.custom_claims = claims;
        Ok(())
    }

    async fn check_ready(&self) -> Result<(), ProviderError> {
        self.simulate_network().await
    }
}
