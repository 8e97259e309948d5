use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::certificate;
use crate::models::enrollment::EnrollmentStatus;
use crate::services::progress::ProgressReport;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEnrollment {
    /// Defaults to the caller for students
    #[validate(range(min = 1))]
    pub student_id: Option<i64>,
    #[validate(range(min = 1))]
    pub batch_id: i64,
    pub status: Option<EnrollmentStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateEnrollmentStatus {
    pub status: EnrollmentStatus,
    /// Admin-only: complete without full progress
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub report: ProgressReport,
    pub certificate: Option<certificate::Model>,
}
