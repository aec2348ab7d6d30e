// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route role requirements and the authorization decision.

use std::collections::BTreeSet;

use super::claims::{roles_of, IdentityRecord};

/// Universal override role. Grants every guarded route.
pub const ADMIN: &str = "admin";
/// Manages school records.
pub const SCHOOL_ADMIN: &str = "school_admin";
/// Reads school records.
pub const TEACHER: &str = "teacher";
/// Reads school records.
pub const PARENT: &str = "parent";

/// Roles a route declares at registration time.
///
/// Immutable once built. The empty requirement admits any caller that reached
/// the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRequirement {
    roles: BTreeSet<String>,
}

impl RoleRequirement {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Requirement that admits every authenticated caller.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

/// Decide whether `identity` may invoke a route requiring `required`.
///
/// Pure function of its two arguments. The `admin` sentinel is checked for
/// each required role in the same pass, so an admin passes any non-empty
/// requirement and an empty requirement passes everyone.
pub fn authorize(required: &RoleRequirement, identity: Option<&IdentityRecord>) -> bool {
    if required.is_empty() {
        return true;
    }

    let Some(identity) = identity else {
        return false;
    };

    let caller = roles_of(identity);
    required
        .iter()
        .any(|role| caller.contains(role) || caller.contains(ADMIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(roles: &[&str]) -> IdentityRecord {
        IdentityRecord::new("user_123").with_roles(roles.iter().copied())
    }

    fn all_school_roles() -> RoleRequirement {
        RoleRequirement::new([ADMIN, SCHOOL_ADMIN, TEACHER, PARENT])
    }

    #[test]
    fn empty_requirement_admits_everyone() {
        let open = RoleRequirement::none();
        assert!(authorize(&open, None));
        assert!(authorize(&open, Some(&caller(&[]))));
        assert!(authorize(&open, Some(&caller(&[ADMIN]))));
    }

    #[test]
    fn missing_identity_is_denied() {
        assert!(!authorize(&RoleRequirement::new([TEACHER]), None));
        assert!(!authorize(&all_school_roles(), None));
    }

    #[test]
    fn intersecting_role_is_admitted() {
        assert!(authorize(&all_school_roles(), Some(&caller(&[TEACHER]))));
    }

    #[test]
    fn disjoint_roles_are_denied() {
        let admin_only = RoleRequirement::new([ADMIN]);
        assert!(!authorize(&admin_only, Some(&caller(&[PARENT]))));
        assert!(!authorize(&admin_only, Some(&caller(&[]))));
    }

    #[test]
    fn admin_overrides_disjoint_requirement() {
        let school_admin = RoleRequirement::new([SCHOOL_ADMIN]);
        assert!(authorize(&school_admin, Some(&caller(&[ADMIN]))));
        assert!(authorize(
            &RoleRequirement::new(["auditor"]),
            Some(&caller(&[PARENT, ADMIN]))
        ));
    }

    #[test]
    fn malformed_roles_claim_is_denied() {
        let mut identity = IdentityRecord::new("user_123");
        identity
            .custom_claims
            .insert("roles".into(), serde_json::Value::String(ADMIN.into()));
        assert!(!authorize(&RoleRequirement::new([ADMIN]), Some(&identity)));
    }

    #[test]
    fn requirement_ignores_declaration_order_and_duplicates() {
        let a = RoleRequirement::new([TEACHER, ADMIN, TEACHER]);
        let b = RoleRequirement::new([ADMIN, TEACHER]);
        assert_eq!(a, b);
    }
}
