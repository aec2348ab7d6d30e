// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory school records.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{CreateSchoolRequest, School, UpdateSchoolRequest, DEFAULT_SCHOOL_TYPE};

#[derive(Default)]
pub struct SchoolStore {
    schools: HashMap<Uuid, School>,
}

impl SchoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, request: CreateSchoolRequest) -> Result<School, ApiError> {
        request.validate()?;

        let now = Utc::now();
        let school = School {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            address: request.address,
            city: request.city,
            state: request.state,
            postal_code: request.postal_code,
            country: request.country,
            phone: request.phone,
            email: request.email,
            school_type: request
                .school_type
                .unwrap_or_else(|| DEFAULT_SCHOOL_TYPE.to_string()),
            geo_lat: request.geo_lat,
            geo_lng: request.geo_lng,
            active: request.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.schools.insert(school.id, school.clone());
        Ok(school)
    }

    /// Schools ordered by name, optionally filtered on `active`.
    pub fn list(&self, active: Option<bool>) -> Vec<School> {
        let mut schools: Vec<School> = self
            .schools
            .values()
            .filter(|school| active.is_none_or(|a| school.active == a))
            .cloned()
            .collect();
        schools.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        schools
    }

    pub fn get(&self, id: &Uuid) -> Result<School, ApiError> {
        self.schools
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub fn update(&mut self, id: &Uuid, request: UpdateSchoolRequest) -> Result<School, ApiError> {
        request.validate()?;
        let school = self.schools.get_mut(id).ok_or_else(|| not_found(id))?;

        if let Some(name) = request.name {
            school.name = name.trim().to_string();
        }
        merge(&mut school.address, request.address);
        merge(&mut school.city, request.city);
        merge(&mut school.state, request.state);
        merge(&mut school.postal_code, request.postal_code);
        merge(&mut school.country, request.country);
        merge(&mut school.phone, request.phone);
        merge(&mut school.email, request.email);
        if let Some(school_type) = request.school_type {
            school.school_type = school_type;
        }
        merge(&mut school.geo_lat, request.geo_lat);
        merge(&mut school.geo_lng, request.geo_lng);
        if let Some(active) = request.active {
            school.active = active;
        }
        school.updated_at = Utc::now();

        Ok(school.clone())
    }

    /// Soft delete: the record stays and is marked inactive.
    pub fn deactivate(&mut self, id: &Uuid) -> Result<School, ApiError> {
        let school = self.schools.get_mut(id).ok_or_else(|| not_found(id))?;
        school.active = false;
        school.updated_at = Utc::now();
        Ok(school.clone())
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }
}

/// `None` keeps the stored value; `Some(None)` clears it.
fn merge<T>(field: &mut Option<T>, value: Option<Option<T>>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn not_found(id: &Uuid) -> ApiError {
    ApiError::not_found(format!("School with ID {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn create(store: &mut SchoolStore, name: &str) -> School {
        store
            .create(CreateSchoolRequest {
                name: name.into(),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn create_applies_defaults() {
        let mut store = SchoolStore::new();
        let school = create(&mut store, "  Lincoln  ");
        assert_eq!(school.name, "Lincoln");
        assert_eq!(school.school_type, "public");
        assert!(school.active);
        assert_eq!(school.created_at, school.updated_at);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_rejects_invalid_input() {
        let mut store = SchoolStore::new();
        let result = store.create(CreateSchoolRequest::default());
        assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert!(store.is_empty());
    }

    #[test]
    fn list_sorts_by_name_and_filters_active() {
        let mut store = SchoolStore::new();
        create(&mut store, "Washington");
        let adams = create(&mut store, "Adams");
        create(&mut store, "Jefferson");
        store.deactivate(&adams.id).unwrap();

        let names = |schools: Vec<School>| schools.into_iter().map(|s| s.name).collect::<Vec<_>>();
        assert_eq!(names(store.list(None)), ["Adams", "Jefferson", "Washington"]);
        assert_eq!(names(store.list(Some(true))), ["Jefferson", "Washington"]);
        assert_eq!(names(store.list(Some(false))), ["Adams"]);
    }

    #[test]
    fn update_merges_present_fields() {
        let mut store = SchoolStore::new();
        let school = store
            .create(CreateSchoolRequest {
                name: "Lincoln".into(),
                city: Some("Portland".into()),
                ..Default::default()
            })
            .unwrap();

        let updated = store
            .update(
                &school.id,
                UpdateSchoolRequest {
                    phone: Some(Some("555-0100".into())),
                    school_type: Some("charter".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Lincoln");
        assert_eq!(updated.city.as_deref(), Some("Portland"));
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.school_type, "charter");
        assert!(updated.updated_at >= school.updated_at);
        assert_eq!(store.get(&school.id).unwrap(), updated);
    }

    #[test]
    fn update_with_null_clears_nullable_fields() {
        let mut store = SchoolStore::new();
        let school = store
            .create(CreateSchoolRequest {
                name: "Lincoln".into(),
                city: Some("Portland".into()),
                phone: Some("555-0100".into()),
                geo_lat: Some(45.5),
                ..Default::default()
            })
            .unwrap();

        let request = serde_json::from_value(serde_json::json!({
            "phone": null,
            "geoLat": null
        }))
        .unwrap();
        let updated = store.update(&school.id, request).unwrap();

        assert_eq!(updated.phone, None);
        assert_eq!(updated.geo_lat, None);
        assert_eq!(updated.city.as_deref(), Some("Portland"));
        assert_eq!(updated.name, "Lincoln");
    }

    #[test]
    fn update_validates_before_writing() {
        let mut store = SchoolStore::new();
        let school = create(&mut store, "Lincoln");
        let result = store.update(
            &school.id,
            UpdateSchoolRequest {
                name: Some(" ".into()),
                ..Default::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(store.get(&school.id).unwrap().name, "Lincoln");
    }

    #[test]
    fn deactivate_keeps_record() {
        let mut store = SchoolStore::new();
        let school = create(&mut store, "Lincoln");
        let removed = store.deactivate(&school.id).unwrap();
        assert!(!removed.active);
        assert!(!store.get(&school.id).unwrap().active);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut store = SchoolStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.get(&id).unwrap_err().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            store.update(&id, UpdateSchoolRequest::default()).unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(store.deactivate(&id).unwrap_err().status(), StatusCode::NOT_FOUND);
    }
}
