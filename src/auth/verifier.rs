// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exchange a bearer token for a freshly loaded identity record.

use std::sync::Arc;
use std::time::Duration;

use super::claims::IdentityRecord;
use super::error::{AuthError, ProviderError};
use super::provider::IdentityProvider;

/// Default bound on a whole verification exchange.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity verifier.
///
/// Holds the process-wide provider handle created at startup. Cloning is
/// cheap; every clone talks to the same provider.
#[derive(Clone)]
pub struct IdentityVerifier {
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl IdentityVerifier {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Verify `token` and load the subject's current record.
    ///
    /// Two provider round trips: the token check, then a lookup of the
    /// subject so that custom claims reflect provider state as of this call
    /// rather than token issuance. Any failure collapses to `InvalidToken`,
    /// except outages and timeouts which become `ProviderUnavailable`.
    pub async fn verify(&self, token: &str) -> Result<IdentityRecord, AuthError> {
        match tokio::time::timeout(self.timeout, self.exchange(token)).await {
            Ok(Ok(identity)) => Ok(identity),
            Ok(Err(err)) => Err(classify(err)),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "identity verification timed out"
                );
                Err(AuthError::ProviderUnavailable)
            }
        }
    }

    async fn exchange(&self, token: &str) -> Result<IdentityRecord, ProviderError> {
        let verified = self.provider.verify_id_token(token).await?;
        let identity = self.provider.get_user(&verified.uid).await?;

        if identity.uid != verified.uid {
            return Err(ProviderError::Internal(format!(
                "lookup for {} returned {}",
                verified.uid, identity.uid
            )));
        }

        tracing::debug!(uid = %identity.uid, expires_at = verified.expires_at, "token verified");
        Ok(identity)
    }
}

/// Outages and local provider faults are logged above `info` so they stand
/// apart from bad client tokens; the client sees the same 401 either way.
fn classify(err: ProviderError) -> AuthError {
    match err {
        ProviderError::Unavailable(reason) => {
            tracing::warn!(%reason, "identity provider unavailable during verification");
            AuthError::ProviderUnavailable
        }
        ProviderError::Internal(reason) => {
            tracing::error!(%reason, "identity provider client failed during verification");
            AuthError::ProviderUnavailable
        }
        other => {
            tracing::info!(error = %other, "token verification failed");
            AuthError::InvalidToken
        }
    }
}
