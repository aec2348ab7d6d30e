// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Administrative role assignment.
//!
//! The only path that changes a principal's authorization state. Writes go
//! to the provider's custom claims and are picked up by the principal's next
//! token verification; requests already past the gate keep the roles they
//! were verified with.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::claims::{roles_claims, roles_of};
use super::error::{ProviderError, RoleAssignmentError};
use super::provider::IdentityProvider;

/// Provider cap on serialized custom claims.
pub const MAX_CLAIMS_BYTES: usize = 1000;

/// Provider cap on uid length.
pub const MAX_UID_LEN: usize = 128;

#[derive(Clone)]
pub struct RoleAssigner {
    provider: Arc<dyn IdentityProvider>,
}

impl RoleAssigner {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Replace `uid`'s roles with exactly `roles`.
    ///
    /// Idempotent: the stored claim is the sorted role list and nothing else.
    pub async fn set_roles(
        &self,
        uid: &str,
        roles: &BTreeSet<String>,
    ) -> Result<(), RoleAssignmentError> {
        validate_uid(uid)?;
        if let Some(blank) = roles.iter().find(|r| r.trim().is_empty()) {
            return Err(RoleAssignmentError::InvalidRole(blank.clone()));
        }

        let claims = roles_claims(roles);
        let size = serde_json::to_string(&claims)
            .map(|s| s.len())
            .unwrap_or(usize::MAX);
        if size > MAX_CLAIMS_BYTES {
            return Err(RoleAssignmentError::ClaimsTooLarge {
                size,
                limit: MAX_CLAIMS_BYTES,
            });
        }

        self.provider
            .set_custom_user_claims(uid, claims)
            .await
            .map_err(|err| provider_failure(uid, err))?;

        tracing::info!(uid, roles = ?roles, "roles assigned");
        Ok(())
    }

    /// Roles the provider currently holds for `uid`.
    pub async fn roles_for(&self, uid: &str) -> Result<BTreeSet<String>, RoleAssignmentError> {
        validate_uid(uid)?;
        let identity = self
            .provider
            .get_user(uid)
            .await
            .map_err(|err| provider_failure(uid, err))?;
        Ok(roles_of(&identity))
    }
}

fn validate_uid(uid: &str) -> Result<(), RoleAssignmentError> {
    if uid.is_empty() || uid.chars().count() > MAX_UID_LEN {
        return Err(RoleAssignmentError::InvalidUid);
    }
    Ok(())
}

fn provider_failure(uid: &str, err: ProviderError) -> RoleAssignmentError {
    match err {
        ProviderError::NotFound => RoleAssignmentError::UnknownUser(uid.to_string()),
        other => {
            tracing::warn!(uid, error = %other, "role assignment provider call failed");
            RoleAssignmentError::Provider(other)
        }
    }
}
