// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization gates for Axum.
//!
//! Guarded routes run two stages in a fixed order:
//!
//! 1. [`authenticate`] reads the bearer token, verifies it against the
//!    provider and stores the resulting [`IdentityRecord`] in the request
//!    extensions, or rejects with 401.
//! 2. [`require_roles`] checks that identity against the route's
//!    [`RoleRequirement`] and rejects with 403 on a miss.
//!
//! The request extensions are the only state the stages write. [`guarded`]
//! attaches both stages to a route, which is how the route table declares
//! its role requirements.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};

use super::claims::IdentityRecord;
use super::error::AuthError;
use super::roles::{authorize, RoleRequirement};
use super::verifier::IdentityVerifier;

/// Attach both gates to `route`.
///
/// `route_layer` wraps outside-in, so the authorization layer is added first
/// and authentication runs before it.
pub fn guarded<S>(
    verifier: &IdentityVerifier,
    route: MethodRouter<S>,
    required: RoleRequirement,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route
        .route_layer(from_fn_with_state(required, require_roles))
        .route_layer(from_fn_with_state(verifier.clone(), authenticate))
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive; the token must be a single non-empty word.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Authentication gate.
///
/// A missing or malformed header is rejected before the provider is called.
/// If the client goes away mid-verification this future is dropped and the
/// request is never touched.
pub async fn authenticate(
    State(verifier): State<IdentityVerifier>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!(reason = %e, path = %request.uri().path(), "request rejected");
            return e.into_response();
        }
    };

    match verifier.verify(token).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Authorization gate.
pub async fn require_roles(
    State(required): State<RoleRequirement>,
    request: Request,
    next: Next,
) -> Response {
    let identity = request.extensions().get::<IdentityRecord>();

    if authorize(&required, identity) {
        return next.run(request).await;
    }

    tracing::info!(
        uid = identity.map(|i| i.uid.as_str()).unwrap_or("<none>"),
        required = ?required,
        path = %request.uri().path(),
        "access denied"
    );
    AuthError::InsufficientPermissions.into_response()
}
