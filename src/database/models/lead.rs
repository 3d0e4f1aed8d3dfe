use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Where a lead came from. Stored as text, checked by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LeadSource {
    Website,
    FacebookAds,
    GoogleAds,
    Referral,
    Events,
    Other,
}

impl LeadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadSource::Website => "website",
            LeadSource::FacebookAds => "facebook_ads",
            LeadSource::GoogleAds => "google_ads",
            LeadSource::Referral => "referral",
            LeadSource::Events => "events",
            LeadSource::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "website" => Some(LeadSource::Website),
            "facebook_ads" => Some(LeadSource::FacebookAds),
            "google_ads" => Some(LeadSource::GoogleAds),
            "referral" => Some(LeadSource::Referral),
            "events" => Some(LeadSource::Events),
            "other" => Some(LeadSource::Other),
            _ => None,
        }
    }
}

/// Pipeline stage of a lead. Stored as text, checked by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Lost,
    Won,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
            LeadStatus::Won => "won",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "qualified" => Some(LeadStatus::Qualified),
            "lost" => Some(LeadStatus::Lost),
            "won" => Some(LeadStatus::Won),
            _ => None,
        }
    }
}

/// Lead row as stored. Owned by exactly one user; the owner never changes.
#[derive(Debug, Clone, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub city: String,
    pub state: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub score: i32,
    pub lead_value: f64,
    pub is_qualified: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated insert payload. Produced by request validation; email is
/// already lowercased and score/lead_value already range-checked.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub city: String,
    pub state: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub score: i32,
    pub lead_value: f64,
    pub is_qualified: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Validated partial update. `None` leaves a field untouched;
/// `last_activity_at: Some(None)` clears the timestamp.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub score: Option<i32>,
    pub lead_value: Option<f64>,
    pub is_qualified: Option<bool>,
    pub last_activity_at: Option<Option<DateTime<Utc>>>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.source.is_none()
            && self.status.is_none()
            && self.score.is_none()
            && self.lead_value.is_none()
            && self.is_qualified.is_none()
            && self.last_activity_at.is_none()
    }
}

/// Client-facing lead view: public `id`, camelCase names, no internal fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub city: String,
    pub state: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub score: i32,
    pub lead_value: f64,
    pub is_qualified: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lead> for LeadResponse {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id,
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            company: lead.company.clone(),
            city: lead.city.clone(),
            state: lead.state.clone(),
            source: lead.source,
            status: lead.status,
            score: lead.score,
            lead_value: lead.lead_value,
            is_qualified: lead.is_qualified,
            last_activity_at: lead.last_activity_at,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

impl From<Lead> for LeadResponse {
    fn from(lead: Lead) -> Self {
        Self::from(&lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lead() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            first_name: "Jane".to_string(),
            last_name: "Roe".to_string(),
            email: "jane@corp.com".to_string(),
            phone: "555-0100".to_string(),
            company: "Corp".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            source: LeadSource::GoogleAds,
            status: LeadStatus::Won,
            score: 80,
            lead_value: 1500.0,
            is_qualified: true,
            last_activity_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn response_uses_camel_case_and_hides_owner() {
        let value = serde_json::to_value(LeadResponse::from(sample_lead())).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("id"));
        assert!(!object.contains_key("userId"));
        assert!(!object.contains_key("user_id"));
        assert_eq!(object["firstName"], "Jane");
        assert_eq!(object["leadValue"], 1500.0);
        assert_eq!(object["isQualified"], true);
        assert_eq!(object["source"], "google_ads");
        assert_eq!(object["status"], "won");
        assert!(object["lastActivityAt"].is_null());
    }

    #[test]
    fn enum_labels_roundtrip() {
        for source in [
            LeadSource::Website,
            LeadSource::FacebookAds,
            LeadSource::GoogleAds,
            LeadSource::Referral,
            LeadSource::Events,
            LeadSource::Other,
        ] {
            assert_eq!(LeadSource::parse(source.as_str()), Some(source));
        }
        for status in [
            LeadStatus::New,
            LeadStatus::Contacted,
            LeadStatus::Qualified,
            LeadStatus::Lost,
            LeadStatus::Won,
        ] {
            assert_eq!(LeadStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(LeadSource::parse("carrier_pigeon"), None);
        assert_eq!(LeadStatus::parse("maybe"), None);
    }

    #[test]
    fn empty_patch_detection() {
        assert!(LeadPatch::default().is_empty());
        let patch = LeadPatch {
            last_activity_at: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
