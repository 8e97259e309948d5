use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::lead::{self, LeadStatus};
use crate::models::lead_log;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLead {
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub source: Option<String>,
    /// Only honoured for admins; sales reps always own the leads they create
    pub assigned_to_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadListParams {
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLeadStatus {
    pub status: LeadStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLeadLog {
    #[validate(length(min = 1, max = 4000))]
    pub note: String,
    pub next_follow_up: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConvertLead {
    #[validate(length(min = 8, max = 128))]
    pub temporary_password: String,
    pub batch_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: lead::Model,
    pub logs: Vec<lead_log::Model>,
}
