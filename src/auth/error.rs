// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication, provider and role assignment errors.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error returned by the authentication and authorization gates.
///
/// Every unauthenticated variant renders the same 401 body. The variants
/// exist so that logs can tell a provider outage from a bad token; callers
/// only ever see "invalid token".
#[derive(Debug)]
pub enum AuthError {
    /// Request carried no `Authorization` header
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`
    InvalidAuthHeader,
    /// Token malformed, expired, rejected, or its subject could not be loaded
    InvalidToken,
    /// Provider unreachable, timed out, or its client is misconfigured
    ProviderUnavailable,
    /// Handler expected an identity the authentication gate did not attach
    MissingIdentity,
    /// Authenticated, but no required role matched
    InsufficientPermissions,
}

/// JSON body shared by the auth and role assignment errors.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    error_code: &'static str,
}

impl AuthError {
    /// Error code exposed to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InsufficientPermissions => "insufficient_permissions",
            _ => "invalid_token",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message exposed to clients. Intentionally coarser than `Display`.
    fn public_message(&self) -> &'static str {
        match self {
            AuthError::InsufficientPermissions => "Caller lacks a role this route requires",
            _ => "Invalid or missing bearer token",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => f.write_str("no Authorization header"),
            AuthError::InvalidAuthHeader => {
                f.write_str("Authorization header is not a single bearer token")
            }
            AuthError::InvalidToken => f.write_str("ID token rejected"),
            AuthError::ProviderUnavailable => f.write_str("identity provider unreachable"),
            AuthError::MissingIdentity => f.write_str("no verified identity attached to request"),
            AuthError::InsufficientPermissions => {
                f.write_str("caller holds none of the required roles")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.public_message(),
            error_code: self.error_code(),
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Failure reported by an identity provider.
///
/// Never rendered to clients; the verifier and the role assigner translate
/// it into their own error types.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused the token or request.
    #[error("rejected by identity provider: {0}")]
    Rejected(String),
    /// The uid is unknown to the provider.
    #[error("user not found")]
    NotFound,
    /// Transport failure, throttling or a provider-side 5xx.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    /// Local failure talking to the provider (bad credentials, bad payload).
    #[error("identity provider client error: {0}")]
    Internal(String),
}

/// Failure while pushing a role set to the provider.
#[derive(Debug, Error)]
pub enum RoleAssignmentError {
    #[error("uid must be 1 to 128 characters")]
    InvalidUid,
    #[error("role names must be non-blank: {0:?}")]
    InvalidRole(String),
    #[error("custom claims exceed {limit} bytes ({size} bytes)")]
    ClaimsTooLarge { size: usize, limit: usize },
    #[error("user {0} not found")]
    UnknownUser(String),
    #[error("identity provider rejected role assignment")]
    Provider(#[source] ProviderError),
}

impl RoleAssignmentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoleAssignmentError::InvalidUid
            | RoleAssignmentError::InvalidRole(_)
            | RoleAssignmentError::ClaimsTooLarge { .. } => StatusCode::BAD_REQUEST,
            RoleAssignmentError::UnknownUser(_) => StatusCode::NOT_FOUND,
            RoleAssignmentError::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RoleAssignmentError::InvalidUid => "invalid_uid",
            RoleAssignmentError::InvalidRole(_) => "invalid_role",
            RoleAssignmentError::ClaimsTooLarge { .. } => "claims_too_large",
            RoleAssignmentError::UnknownUser(_) => "unknown_user",
            RoleAssignmentError::Provider(_) => "role_assignment_failed",
        }
    }
}

impl IntoResponse for RoleAssignmentError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let body = ErrorBody {
            error: &message,
            error_code: self.error_code(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_header_challenges_for_bearer() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error_code"], "invalid_token");
        assert_eq!(json["error"], "Invalid or missing bearer token");
    }

    #[tokio::test]
    async fn unauthenticated_variants_share_one_body() {
        let mut bodies = Vec::new();
        for err in [
            AuthError::MissingAuthHeader,
            AuthError::InvalidAuthHeader,
            AuthError::InvalidToken,
            AuthError::ProviderUnavailable,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            bodies.push(to_bytes(response.into_body(), usize::MAX).await.unwrap());
        }
        assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn role_mismatch_is_forbidden_without_challenge() {
        let response = AuthError::InsufficientPermissions.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn role_assignment_errors_map_to_distinct_statuses() {
        assert_eq!(RoleAssignmentError::InvalidUid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RoleAssignmentError::UnknownUser("u1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RoleAssignmentError::Provider(ProviderError::Unavailable("down".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
