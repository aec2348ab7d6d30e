// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified identity records and role extraction from custom claims.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Custom claim key carrying the principal's roles.
pub const ROLES_CLAIM: &str = "roles";

/// A principal as the identity provider currently knows it.
///
/// Built fresh after every successful token verification and attached to the
/// request that produced it. Never cached or shared across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    /// Provider-assigned user id, stable across sessions.
    pub uid: String,

    /// Display attribute, not trust-bearing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display attribute, not trust-bearing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Provider-controlled claims, including the optional `roles` array.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub custom_claims: Map<String, Value>,
}

impl IdentityRecord {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
            custom_claims: Map::new(),
        }
    }

    /// Replace the `roles` claim.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles = roles.into_iter().map(|r| Value::String(r.into())).collect();
        self.custom_claims
            .insert(ROLES_CLAIM.to_string(), Value::Array(roles));
        self
    }
}

/// Token fields the provider vouched for. Claims are deliberately absent:
/// they are always re-read from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub uid: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Roles carried by an identity's custom claims.
///
/// A missing `roles` claim, a non-array value or an array holding anything
/// other than strings yields the empty set.
pub fn roles_of(identity: &IdentityRecord) -> BTreeSet<String> {
    let Some(Value::Array(entries)) = identity.custom_claims.get(ROLES_CLAIM) else {
        return BTreeSet::new();
    };

    entries
        .iter()
        .map(|entry| entry.as_str().map(str::to_string))
        .collect::<Option<BTreeSet<_>>>()
        .unwrap_or_default()
}

/// Custom claims written by role assignment. Replaces every other claim.
pub fn roles_claims(roles: &BTreeSet<String>) -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert(
        ROLES_CLAIM.to_string(),
        Value::Array(roles.iter().cloned().map(Value::String).collect()),
    );
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity_with(claims: Value) -> IdentityRecord {
        IdentityRecord {
            uid: "user_123".to_string(),
            email: Some("teacher@example.edu".to_string()),
            display_name: None,
            custom_claims: claims.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn roles_of_reads_string_array() {
        let identity = identity_with(json!({ "roles": ["teacher", "parent"] }));
        let roles = roles_of(&identity);
        assert_eq!(roles, BTreeSet::from(["parent".to_string(), "teacher".to_string()]));
    }

    #[test]
    fn roles_of_defaults_to_empty() {
        assert!(roles_of(&identity_with(json!({}))).is_empty());
        assert!(roles_of(&identity_with(json!({ "tier": "gold" }))).is_empty());
    }

    #[test]
    fn roles_of_rejects_non_array_values() {
        assert!(roles_of(&identity_with(json!({ "roles": "admin" }))).is_empty());
        assert!(roles_of(&identity_with(json!({ "roles": { "admin": true } }))).is_empty());
        assert!(roles_of(&identity_with(json!({ "roles": null }))).is_empty());
    }

    #[test]
    fn roles_of_rejects_mixed_arrays() {
        let identity = identity_with(json!({ "roles": ["admin", 7] }));
        assert!(roles_of(&identity).is_empty());
    }

    #[test]
    fn roles_of_collapses_duplicates() {
        let identity = identity_with(json!({ "roles": ["teacher", "teacher"] }));
        assert_eq!(roles_of(&identity).len(), 1);
    }

    #[test]
    fn with_roles_round_trips_through_roles_of() {
        let identity = IdentityRecord::new("u1").with_roles(["admin", "teacher"]);
        assert_eq!(
            roles_of(&identity),
            BTreeSet::from(["admin".to_string(), "teacher".to_string()])
        );
    }

    #[test]
    fn roles_claims_holds_only_roles() {
        let claims = roles_claims(&BTreeSet::from(["teacher".to_string()]));
        assert_eq!(Value::Object(claims), json!({ "roles": ["teacher"] }));
    }
}
