// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors for the school records API.
//!
//! Rendered as `{error, error_code}`, the same shape the auth errors use.
//! Axum extractor rejections are folded in as 400s so a malformed body, path
//! or query never leaks axum's plain-text rejection.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable machine-readable code for the body.
    pub fn error_code(&self) -> &'static str {
        if self.status == StatusCode::NOT_FOUND {
            "not_found"
        } else {
            "invalid_request"
        }
    }
}

#[derive(Serialize)]
struct Body<'a> {
    error: &'a str,
    error_code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Body {
            error: &self.message,
            error_code: self.error_code(),
        };
        (self.status, Json(body)).into_response()
    }
}

macro_rules! rejection_is_bad_request {
    ($($rejection:ty),+) => {
        $(impl From<$rejection> for ApiError {
            fn from(rejection: $rejection) -> Self {
                Self::bad_request(rejection.body_text())
            }
        })+
    };
}

rejection_is_bad_request!(JsonRejection, PathRejection, QueryRejection);
