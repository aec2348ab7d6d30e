// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;

use crate::auth::{roles_of, Identity, IdentityRecord};
use crate::models::MeResponse;

impl From<IdentityRecord> for MeResponse {
    fn from(identity: IdentityRecord) -> Self {
        Self {
            roles: roles_of(&identity),
            uid: identity.uid,
            email: identity.email,
            display_name: identity.display_name,
        }
    }
}

/// Get the current caller's identity and roles.
///
/// Roles are those the provider returned for this request, so a change made
/// through the role API shows up here on the next call.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = MeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Identity(identity): Identity) -> Json<MeResponse> {
    Json(identity.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn me_response_from_identity() {
        let mut identity = IdentityRecord::new("user_123").with_roles(["teacher", "parent"]);
        identity.email = Some("t@example.org".to_string());

        let response: MeResponse = identity.into();
        assert_eq!(response.uid, "user_123");
        assert_eq!(response.email.as_deref(), Some("t@example.org"));
        assert!(response.roles.contains("teacher"));
        assert!(response.roles.contains("parent"));
    }

    #[test]
    fn malformed_roles_claim_reports_no_roles() {
        let mut identity = IdentityRecord::new("user_123");
        identity
            .custom_claims
            .insert("roles".to_string(), serde_json::json!("admin"));

        let response: MeResponse = identity.into();
        assert!(response.roles.is_empty());
    }
}
