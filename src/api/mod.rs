// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route table.
//!
//! Every guarded route is registered together with the roles it requires;
//! the handlers themselves never check roles.

use axum::{
    http::{header::HeaderName, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        guarded,
        roles::{ADMIN, PARENT, SCHOOL_ADMIN, TEACHER},
        IdentityVerifier, RoleRequirement,
    },
    models::{
        CreateSchoolRequest, MeResponse, School, SetRolesRequest, SetRolesResponse,
        UpdateSchoolRequest, UserRolesResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod schools;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Roles allowed to read school records.
const SCHOOL_READERS: [&str; 4] = [ADMIN, SCHOOL_ADMIN, TEACHER, PARENT];
/// Roles allowed to create and edit school records.
const SCHOOL_EDITORS: [&str; 2] = [ADMIN, SCHOOL_ADMIN];

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let v1 = v1_routes(&state.verifier);

    Router::new()
        .nest("/v1", v1)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(cors_origins))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    MakeRequestUuid,
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http()),
        )
}

fn v1_routes(verifier: &IdentityVerifier) -> Router<AppState> {
    let readers = || RoleRequirement::new(SCHOOL_READERS);
    let editors = || RoleRequirement::new(SCHOOL_EDITORS);
    let admins = || RoleRequirement::new([ADMIN]);

    Router::new()
        .route(
            "/schools",
            guarded(verifier, post(schools::create_school), editors())
                .merge(guarded(verifier, get(schools::list_schools), readers())),
        )
        .route(
            "/schools/{id}",
            guarded(verifier, get(schools::get_school), readers())
                .merge(guarded(verifier, put(schools::update_school), editors()))
                .merge(guarded(verifier, delete(schools::delete_school), admins())),
        )
        .route(
            "/users/me",
            guarded(verifier, get(users::get_current_user), RoleRequirement::none()),
        )
        .route(
            "/admin/users/{uid}/roles",
            guarded(verifier, get(admin::get_user_roles), admins())
                .merge(guarded(verifier, put(admin::set_user_roles), admins())),
        )
}

/// Permissive when no origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        schools::create_school,
        schools::list_schools,
        schools::get_school,
        schools::update_school,
        schools::delete_school,
        users::get_current_user,
        admin::get_user_roles,
        admin::set_user_roles,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            School,
            CreateSchoolRequest,
            UpdateSchoolRequest,
            MeResponse,
            UserRolesResponse,
            SetRolesRequest,
            SetRolesResponse,
            health::ProbeStatus,
            health::ProbeReport,
            health::LivenessReport
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Schools", description = "School records"),
        (name = "Users", description = "Caller identity"),
        (name = "Admin", description = "Role assignment"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
