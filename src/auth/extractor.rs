// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the verified caller.
//!
//! The extractor only reads what [`authenticate`](super::middleware::authenticate)
//! stored in the request extensions; it never talks to the provider itself.
//!
//! ```rust,ignore
//! async fn my_handler(Identity(caller): Identity) -> impl IntoResponse {
//!     // caller is the IdentityRecord fetched for this request
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, IdentityRecord};

/// The caller's identity record, as fetched during authentication.
///
/// Rejects with 401 when used on a route that is not behind the
/// authentication gate.
#[derive(Debug, Clone)]
pub struct Identity(pub IdentityRecord);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityRecord>()
            .cloned()
            .map(Identity)
            .ok_or(AuthError::MissingIdentity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn reads_identity_from_extensions() {
        let mut parts = parts();
        parts
            .extensions
            .insert(IdentityRecord::new("user_123").with_roles(["teacher"]));

        let Identity(identity) = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity.uid, "user_123");
    }

    #[tokio::test]
    async fn ungated_route_is_rejected() {
        let mut parts = parts();
        let result = Identity::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingIdentity)));
    }

    #[tokio::test]
    async fn authorization_header_alone_is_not_enough() {
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer anything")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Identity::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingIdentity)));
    }
}
