// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! School Registry - school records API with provider-backed roles
//!
//! Callers authenticate with Firebase ID tokens. Each guarded route declares
//! the roles it accepts, and the caller's roles are read from the provider's
//! custom claims on every request.
//!
//! ## Modules
//!
//! - `api` - HTTP route table and handlers (Axum)
//! - `auth` - Identity verification, role checks and role assignment
//! - `config` - Environment configuration
//! - `store` - In-memory school records

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
