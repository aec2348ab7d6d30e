// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The identity provider contract.
//!
//! These calls are everything the auth core needs from a provider. Any
//! implementation of this shape (Firebase, the in-memory provider used in
//! tests) can be injected into the verifier and the role assigner.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::claims::{IdentityRecord, VerifiedToken};
use super::error::ProviderError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check signature and expiry of an ID token.
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, ProviderError>;

    /// Load the current record (including custom claims) for `uid`.
    async fn get_user(&self, uid: &str) -> Result<IdentityRecord, ProviderError>;

    /// Replace the custom claims stored for `uid`.
    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: Map<String, Value>,
    ) -> Result<(), ProviderError>;

    /// Readiness probe used by the health endpoint.
    async fn check_ready(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
