// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and the OpenAPI
//! document. Field names are camelCase on the wire.
//!
//! ## Model Categories
//!
//! - **Schools**: school records and their create/update requests
//! - **Users**: role inspection and assignment bodies

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;

/// School type stored when the client does not send one.
pub const DEFAULT_SCHOOL_TYPE: &str = "public";

// =============================================================================
// School Models
// =============================================================================

/// A school record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct School {
    /// Server-assigned identifier.
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Free-form category, `public` unless set.
    #[serde(rename = "type")]
    pub school_type: String,
    /// Latitude in degrees, -90 to 90.
    pub geo_lat: Option<f64>,
    /// Longitude in degrees, -180 to 180.
    pub geo_lng: Option<f64>,
    /// Inactive schools are kept; deletion only clears this flag.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a school.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchoolRequest {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "type")]
    pub school_type: Option<String>,
    #[serde(default)]
    pub geo_lat: Option<f64>,
    #[serde(default)]
    pub geo_lng: Option<f64>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Partial update.
///
/// An absent field is left unchanged. On the nullable columns an explicit
/// `null` clears the stored value; `name`, `type` and `active` cannot be
/// cleared, so `null` there also leaves them unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSchoolRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub postal_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, rename = "type")]
    pub school_type: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub geo_lat: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub geo_lng: Option<Option<f64>>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// `null` becomes `Some(None)`; with `#[serde(default)]` an absent field
/// stays `None`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query string for `GET /v1/schools`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSchoolsQuery {
    /// Only schools with this `active` flag; all schools when omitted.
    pub active: Option<bool>,
}

impl CreateSchoolRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_coordinates(self.geo_lat, self.geo_lng)
    }
}

impl UpdateSchoolRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        validate_coordinates(self.geo_lat.flatten(), self.geo_lng.flatten())
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("School name must not be blank"));
    }
    Ok(())
}

fn validate_coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(), ApiError> {
    if let Some(lat) = lat {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ApiError::bad_request("geoLat must be between -90 and 90"));
        }
    }
    if let Some(lng) = lng {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ApiError::bad_request("geoLng must be between -180 and 180"));
        }
    }
    Ok(())
}

// =============================================================================
// User Models
// =============================================================================

/// The caller's own identity as seen by the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Roles read from the provider for this request.
    pub roles: BTreeSet<String>,
}

/// Roles held by a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRolesResponse {
    pub uid: String,
    pub roles: BTreeSet<String>,
}

/// Replace a user's roles. An empty list removes every role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetRolesRequest {
    pub roles: BTreeSet<String>,
}

/// Result of a role assignment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetRolesResponse {
    pub uid: String,
    pub roles: BTreeSet<String>,
    /// When the change applies to the user's requests; always `next_request`.
    pub effective: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn create_request_accepts_camel_case_and_type() {
        let request: CreateSchoolRequest = serde_json::from_value(json!({
            "name": "Lincoln Elementary",
            "postalCode": "97201",
            "type": "charter",
            "geoLat": 45.5,
            "geoLng": -122.6
        }))
        .unwrap();

        assert_eq!(request.postal_code.as_deref(), Some("97201"));
        assert_eq!(request.school_type.as_deref(), Some("charter"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let request = CreateSchoolRequest {
            name: "   ".into(),
            ..Default::default()
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn coordinates_out_of_range_are_rejected() {
        let request = CreateSchoolRequest {
            name: "North".into(),
            geo_lat: Some(91.0),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let update = UpdateSchoolRequest {
            geo_lng: Some(Some(-180.5)),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let edge = UpdateSchoolRequest {
            geo_lat: Some(Some(-90.0)),
            geo_lng: Some(Some(180.0)),
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn update_may_omit_name_but_not_blank_it() {
        assert!(UpdateSchoolRequest::default().validate().is_ok());
        let update = UpdateSchoolRequest {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn update_tells_null_from_absent() {
        let update: UpdateSchoolRequest = serde_json::from_value(json!({
            "phone": null,
            "geoLat": null,
            "city": "Salem",
            "name": null
        }))
        .unwrap();

        assert_eq!(update.phone, Some(None));
        assert_eq!(update.geo_lat, Some(None));
        assert_eq!(update.city, Some(Some("Salem".to_string())));
        assert_eq!(update.address, None);
        assert_eq!(update.geo_lng, None);
        assert_eq!(update.name, None);
        assert!(update.validate().is_ok());
    }

    #[test]
    fn school_serializes_camel_case() {
        let now = Utc::now();
        let school = School {
            id: Uuid::new_v4(),
            name: "Lincoln".into(),
            address: None,
            city: None,
            state: None,
            postal_code: Some("97201".into()),
            country: None,
            phone: None,
            email: None,
            school_type: DEFAULT_SCHOOL_TYPE.into(),
            geo_lat: None,
            geo_lng: None,
            active: true,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&school).unwrap();
        assert_eq!(value["postalCode"], "97201");
        assert_eq!(value["type"], "public");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("school_type").is_none());
    }
}
