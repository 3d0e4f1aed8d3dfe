use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::user::is_valid_email;
use crate::database::models::{LeadPatch, LeadResponse, LeadSource, LeadStatus, NewLead};
use crate::database::LeadStore;
use crate::error::ApiError;
use crate::filter;
use crate::middleware::AuthUser;
use crate::AppState;

use super::Json;

/// Fields default to empty/zero when omitted so validation reports every
/// missing field by name instead of the body failing to deserialize
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateLeadRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub city: String,
    pub state: String,
    pub source: String,
    pub status: String,
    pub score: i64,
    pub lead_value: f64,
    pub is_qualified: bool,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl CreateLeadRequest {
    fn validate(&self) -> Result<NewLead, HashMap<String, String>> {
        let mut errors = HashMap::new();

        require(&mut errors, "firstName", &self.first_name, "First name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");
        require(&mut errors, "phone", &self.phone, "Phone is required");
        require(&mut errors, "company", &self.company, "Company is required");
        require(&mut errors, "city", &self.city, "City is required");
        require(&mut errors, "state", &self.state, "State is required");

        if !is_valid_email(self.email.trim()) {
            errors.insert("email".to_string(), "Please provide a valid email".to_string());
        }
        let source = LeadSource::parse(&self.source);
        if source.is_none() {
            errors.insert("source".to_string(), "Invalid source".to_string());
        }
        let status = LeadStatus::parse(&self.status);
        if status.is_none() {
            errors.insert("status".to_string(), "Invalid status".to_string());
        }
        if !(0..=100).contains(&self.score) {
            errors.insert("score".to_string(), "Score must be between 0 and 100".to_string());
        }
        if !(self.lead_value.is_finite() && self.lead_value >= 0.0) {
            errors.insert(
                "leadValue".to_string(),
                "Lead value must be a positive number".to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewLead {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.trim().to_string(),
            company: self.company.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            source: source.unwrap_or(LeadSource::Website),
            status: status.unwrap_or(LeadStatus::New),
            score: self.score as i32,
            lead_value: self.lead_value,
            is_qualified: self.is_qualified,
            last_activity_at: self.last_activity_at,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub score: Option<i64>,
    pub lead_value: Option<f64>,
    pub is_qualified: Option<bool>,
    /// Absent leaves the field alone; explicit null clears it
    #[serde(default, deserialize_with = "double_option")]
    pub last_activity_at: Option<Option<DateTime<Utc>>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer).map(Some)
}

impl UpdateLeadRequest {
    fn validate(&self) -> Result<LeadPatch, HashMap<String, String>> {
        let mut errors = HashMap::new();

        for (key, value, message) in [
            ("firstName", &self.first_name, "First name is required"),
            ("lastName", &self.last_name, "Last name is required"),
            ("phone", &self.phone, "Phone is required"),
            ("company", &self.company, "Company is required"),
            ("city", &self.city, "City is required"),
            ("state", &self.state, "State is required"),
        ] {
            if let Some(v) = value {
                require(&mut errors, key, v, message);
            }
        }

        if let Some(email) = &self.email {
            if !is_valid_email(email.trim()) {
                errors.insert("email".to_string(), "Please provide a valid email".to_string());
            }
        }
        let source = match &self.source {
            Some(s) => match LeadSource::parse(s) {
                Some(source) => Some(source),
                None => {
                    errors.insert("source".to_string(), "Invalid source".to_string());
                    None
                }
            },
            None => None,
        };
        let status = match &self.status {
            Some(s) => match LeadStatus::parse(s) {
                Some(status) => Some(status),
                None => {
                    errors.insert("status".to_string(), "Invalid status".to_string());
                    None
                }
            },
            None => None,
        };
        if let Some(score) = self.score {
            if !(0..=100).contains(&score) {
                errors.insert("score".to_string(), "Score must be between 0 and 100".to_string());
            }
        }
        if let Some(lead_value) = self.lead_value {
            if !(lead_value.is_finite() && lead_value >= 0.0) {
                errors.insert(
                    "leadValue".to_string(),
                    "Lead value must be a positive number".to_string(),
                );
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(LeadPatch {
            first_name: self.first_name.as_ref().map(|v| v.trim().to_string()),
            last_name: self.last_name.as_ref().map(|v| v.trim().to_string()),
            email: self.email.as_ref().map(|v| v.trim().to_lowercase()),
            phone: self.phone.as_ref().map(|v| v.trim().to_string()),
            company: self.company.as_ref().map(|v| v.trim().to_string()),
            city: self.city.as_ref().map(|v| v.trim().to_string()),
            state: self.state.as_ref().map(|v| v.trim().to_string()),
            source,
            status,
            score: self.score.map(|s| s as i32),
            lead_value: self.lead_value,
            is_qualified: self.is_qualified,
            last_activity_at: self.last_activity_at,
        })
    }
}

/// GET /leads - list, filter, paginate
pub async fn list_leads(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let filter = filter::compile(&params, auth_user.id);
    let (items, total) = LeadStore::new(state.db.pool().clone()).list(&filter).await?;

    let total_pages = if total == 0 {
        0
    } else {
        (total + filter.limit - 1) / filter.limit
    };

    Ok(Json(json!({
        "data": items.iter().map(LeadResponse::from).collect::<Vec<_>>(),
        "page": filter.page,
        "limit": filter.limit,
        "total": total,
        "totalPages": total_pages,
    })))
}

/// POST /leads - create a lead owned by the current user
pub async fn create_lead(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new_lead = payload
        .validate()
        .map_err(|errors| ApiError::validation_error("Validation failed", Some(errors)))?;

    let lead = LeadStore::new(state.db.pool().clone())
        .insert(auth_user.id, &new_lead)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Lead created successfully",
            "lead": LeadResponse::from(lead),
        })),
    ))
}

/// GET /leads/:id
pub async fn get_lead(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_lead_id(&id)?;
    let lead = LeadStore::new(state.db.pool().clone())
        .get(id, auth_user.id)
        .await?;
    Ok(Json(json!({ "lead": LeadResponse::from(lead) })))
}

/// PUT /leads/:id - partial update; the owner is immutable
pub async fn update_lead(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLeadRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_lead_id(&id)?;
    let patch = payload
        .validate()
        .map_err(|errors| ApiError::validation_error("Validation failed", Some(errors)))?;

    let store = LeadStore::new(state.db.pool().clone());
    let lead = if patch.is_empty() {
        // Nothing to change; still 404s on a foreign or missing id
        store.get(id, auth_user.id).await?
    } else {
        store.update(id, auth_user.id, &patch).await?
    };

    Ok(Json(json!({
        "message": "Lead updated successfully",
        "lead": LeadResponse::from(lead),
    })))
}

/// DELETE /leads/:id
pub async fn delete_lead(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_lead_id(&id)?;
    LeadStore::new(state.db.pool().clone())
        .delete(id, auth_user.id)
        .await?;
    Ok(Json(json!({ "message": "Lead deleted successfully" })))
}

/// A non-UUID id cannot match any lead, so it reads as the same 404 a
/// foreign id would produce
fn parse_lead_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found("Lead not found"))
}

fn require(errors: &mut HashMap<String, String>, key: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(key.to_string(), message.to_string());
    }
}
