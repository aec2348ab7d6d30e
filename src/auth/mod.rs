// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Firebase identity and role-based access control for the school registry.
//!
//! ## Auth Flow
//!
//! 1. Clients sign in with Firebase and send `Authorization: Bearer <ID token>`
//! 2. The server:
//!    - verifies the ID token with the provider
//!    - loads the user record, including custom claims, on every request
//!    - reads `roles` from those claims
//! 3. Each guarded route checks the caller's roles against the set it
//!    declared at registration; `admin` passes every guarded route
//!
//! ## Security
//!
//! - Roles are never cached; a change made through the role API applies to
//!   the caller's next request without a token refresh
//! - Every verification failure, including a provider outage, is a 401
//! - Signing keys are fetched over HTTPS and cached with a TTL; an unknown
//!   `kid` refetches at most once per 30 seconds
//! - Clock skew tolerance is 60 seconds

pub mod assignment;
pub mod claims;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod firebase;
pub mod jwks;
pub mod memory;
pub mod middleware;
pub mod provider;
pub mod roles;
#[cfg(test)]
pub(crate) mod test_keys;
pub mod verifier;

pub use assignment::RoleAssigner;
pub use claims::{roles_of, IdentityRecord, VerifiedToken};
pub use error::{AuthError, ProviderError, RoleAssignmentError};
pub use extractor::Identity;
pub use firebase::{FirebaseProvider, FirebaseSettings};
pub use memory::InMemoryIdentityProvider;
pub use middleware::guarded;
pub use provider::IdentityProvider;
pub use roles::{authorize, RoleRequirement};
pub use verifier::IdentityVerifier;
