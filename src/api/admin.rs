// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only role management.
//!
//! Both endpoints are registered behind the `admin` requirement. Assignments
//! are written to the provider's custom claims and apply to the target
//! user's next request.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    auth::Identity,
    error::ApiError,
    models::{SetRolesRequest, SetRolesResponse, UserRolesResponse},
    state::AppState,
};

/// Value of [`SetRolesResponse::effective`].
pub const EFFECTIVE_NEXT_REQUEST: &str = "next_request";

#[utoipa::path(
    get,
    path = "/v1/admin/users/{uid}/roles",
    params(("uid" = String, Path, description = "Provider user id")),
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserRolesResponse),
        (status = 403, description = "Requires admin"),
        (status = 404, description = "Unknown user"),
        (status = 502, description = "Identity provider failure")
    )
)]
pub async fn get_user_roles(
    State(state): State<AppState>,
    uid: Result<Path<String>, PathRejection>,
) -> Result<Json<UserRolesResponse>, Response> {
    let Path(uid) = uid.map_err(|e| ApiError::from(e).into_response())?;
    let roles = state
        .roles
        .roles_for(&uid)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(UserRolesResponse { uid, roles }))
}

#[utoipa::path(
    put,
    path = "/v1/admin/users/{uid}/roles",
    params(("uid" = String, Path, description = "Provider user id")),
    request_body = SetRolesRequest,
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SetRolesResponse),
        (status = 400, description = "Invalid uid or role set"),
        (status = 403, description = "Requires admin"),
        (status = 404, description = "Unknown user"),
        (status = 502, description = "Identity provider failure")
    )
)]
pub async fn set_user_roles(
    State(state): State<AppState>,
    Identity(caller): Identity,
    uid: Result<Path<String>, PathRejection>,
    payload: Result<Json<SetRolesRequest>, JsonRejection>,
) -> Result<Json<SetRolesResponse>, Response> {
    let Path(uid) = uid.map_err(|e| ApiError::from(e).into_response())?;
    let Json(request) = payload.map_err(|e| ApiError::from(e).into_response())?;

    state
        .roles
        .set_roles(&uid, &request.roles)
        .await
        .map_err(IntoResponse::into_response)?;

    tracing::info!(target_uid = %uid, by = %caller.uid, "admin changed user roles");
    Ok(Json(SetRolesResponse {
        uid,
        roles: request.roles,
        effective: EFFECTIVE_NEXT_REQUEST.to_string(),
    }))
}
