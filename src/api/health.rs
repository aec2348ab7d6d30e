// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Probes for the orchestrator.
//!
//! Every guarded route answers 401 while the identity provider is down, so
//! `/health/ready` is where an outage shows up as such.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Up,
    Down,
}

impl From<bool> for ProbeStatus {
    fn from(up: bool) -> Self {
        if up {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// Readiness report.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeReport {
    /// `up` only when every dependency is up.
    pub status: ProbeStatus,
    pub version: &'static str,
    /// Whether ID tokens can currently be verified.
    pub identity_provider: ProbeStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessReport {
    pub status: ProbeStatus,
}

async fn probe(state: &AppState) -> (StatusCode, Json<ProbeReport>) {
    let provider = match state.provider().check_ready().await {
        Ok(()) => ProbeStatus::Up,
        Err(e) => {
            tracing::warn!(error = %e, "identity provider not ready");
            ProbeStatus::Down
        }
    };

    let code = match provider {
        ProbeStatus::Up => StatusCode::OK,
        ProbeStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    let report = ProbeReport {
        status: provider,
        version: env!("CARGO_PKG_VERSION"),
        identity_provider: provider,
    };
    (code, Json(report))
}

/// Overall health, including the identity provider.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies up", body = ProbeReport),
        (status = 503, description = "A dependency is down", body = ProbeReport)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ProbeReport>) {
    probe(&state).await
}

/// The process is serving requests.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is up", body = LivenessReport))
)]
pub async fn liveness() -> Json<LivenessReport> {
    Json(LivenessReport {
        status: ProbeStatus::Up,
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready for traffic", body = ProbeReport),
        (status = 503, description = "Identity provider unreachable", body = ProbeReport)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ProbeReport>) {
    probe(&state).await
}
