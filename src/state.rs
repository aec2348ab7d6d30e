// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::auth::verifier::DEFAULT_VERIFY_TIMEOUT;
use crate::auth::{IdentityProvider, IdentityVerifier, InMemoryIdentityProvider, RoleAssigner};
use crate::store::SchoolStore;

#[derive(Clone)]
pub struct AppState {
    pub schools: Arc<RwLock<SchoolStore>>,
    pub verifier: IdentityVerifier,
    pub roles: RoleAssigner,
}

impl AppState {
    /// One provider handle is shared by verification and role assignment.
    pub fn new(provider: Arc<dyn IdentityProvider>, verify_timeout: Duration) -> Self {
        Self {
            schools: Arc::new(RwLock::new(SchoolStore::new())),
            verifier: IdentityVerifier::new(provider.clone()).with_timeout(verify_timeout),
            roles: RoleAssigner::new(provider),
        }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        self.verifier.provider()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Arc::new(InMemoryIdentityProvider::new()),
            DEFAULT_VERIFY_TIMEOUT,
        )
    }
}
