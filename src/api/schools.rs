// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! School record endpoints. Role requirements are attached in the route
//! table, not here.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::Identity,
    error::ApiError,
    models::{CreateSchoolRequest, ListSchoolsQuery, School, UpdateSchoolRequest},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/schools",
    request_body = CreateSchoolRequest,
    tag = "Schools",
    security(("bearer" = [])),
    responses(
        (status = 201, body = School),
        (status = 400, description = "Invalid school data"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Requires admin or school_admin")
    )
)]
pub async fn create_school(
    State(state): State<AppState>,
    Identity(caller): Identity,
    payload: Result<Json<CreateSchoolRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<School>), ApiError> {
    let Json(request) = payload?;
    let school = state.schools.write().await.create(request)?;
    tracing::info!(school_id = %school.id, uid = %caller.uid, "school created");
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/v1/schools",
    params(ListSchoolsQuery),
    tag = "Schools",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [School]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "No school role")
    )
)]
pub async fn list_schools(
    State(state): State<AppState>,
    query: Result<Query<ListSchoolsQuery>, QueryRejection>,
) -> Result<Json<Vec<School>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.schools.read().await.list(query.active)))
}

#[utoipa::path(
    get,
    path = "/v1/schools/{id}",
    params(("id" = Uuid, Path, description = "School identifier")),
    tag = "Schools",
    security(("bearer" = [])),
    responses(
        (status = 200, body = School),
        (status = 404, description = "School not found")
    )
)]
pub async fn get_school(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<School>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.schools.read().await.get(&id)?))
}

#[utoipa::path(
    put,
    path = "/v1/schools/{id}",
    params(("id" = Uuid, Path, description = "School identifier")),
    request_body = UpdateSchoolRequest,
    tag = "Schools",
    security(("bearer" = [])),
    responses(
        (status = 200, body = School),
        (status = 400, description = "Invalid school data"),
        (status = 404, description = "School not found")
    )
)]
pub async fn update_school(
    State(state): State<AppState>,
    Identity(caller): Identity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateSchoolRequest>, JsonRejection>,
) -> Result<Json<School>, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let school = state.schools.write().await.update(&id, request)?;
    tracing::info!(school_id = %id, uid = %caller.uid, "school updated");
    Ok(Json(school))
}

/// Deactivate a school. The record is kept and returned.
#[utoipa::path(
    delete,
    path = "/v1/schools/{id}",
    params(("id" = Uuid, Path, description = "School identifier")),
    tag = "Schools",
    security(("bearer" = [])),
    responses(
        (status = 200, body = School),
        (status = 403, description = "Requires admin"),
        (status = 404, description = "School not found")
    )
)]
pub async fn delete_school(
    State(state): State<AppState>,
    Identity(caller): Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<School>, ApiError> {
    let Path(id) = id?;
    let school = state.schools.write().await.deactivate(&id)?;
    tracing::info!(school_id = %id, uid = %caller.uid, "school deactivated");
    Ok(Json(school))
}
