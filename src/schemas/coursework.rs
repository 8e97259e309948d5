use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{grade, submission};

const DEFAULT_MAX_SCORE: i32 = 100;

fn default_max_score() -> i32 {
    DEFAULT_MAX_SCORE
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignStaff {
    #[validate(range(min = 1))]
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssignment {
    #[validate(range(min = 1))]
    pub bootcamp_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default = "default_max_score")]
    #[validate(range(min = 1, max = 1000))]
    pub max_score: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAssignment {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 1000))]
    pub max_score: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentQuery {
    pub bootcamp_id: Option<i64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_submission_body"))]
pub struct CreateSubmission {
    #[validate(url)]
    pub submission_url: Option<String>,
    pub content: Option<String>,
}

fn validate_submission_body(request: &CreateSubmission) -> Result<(), ValidationError> {
    let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
    if blank(&request.submission_url) && blank(&request.content) {
        let mut err = ValidationError::new("empty_submission");
        err.message = Some("submission_url or content is required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GradeSubmission {
    #[validate(range(min = 0))]
    pub score: i32,
    pub feedback: Option<String>,
}

/// A submission together with its grade, if graded
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    #[serde(flatten)]
    pub submission: submission::Model,
    pub grade: Option<grade::Model>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_review_dates"))]
pub struct CreateReview {
    #[validate(range(min = 1, max = 10))]
    pub technical_skills: Option<i32>,
    #[validate(range(min = 1, max = 10))]
    pub soft_skills: Option<i32>,
    #[validate(range(min = 1, max = 10))]
    pub attendance: Option<i32>,
    #[validate(range(min = 1, max = 10))]
    pub participation: Option<i32>,
    pub strengths: Option<String>,
    pub areas_for_improvement: Option<String>,
    pub action_plan: Option<String>,
    /// Defaults to today
    pub review_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,
}

fn validate_review_dates(review: &CreateReview) -> Result<(), ValidationError> {
    if let (Some(date), Some(next)) = (review.review_date, review.next_review_date) {
        if next < date {
            let mut err = ValidationError::new("date_order");
            err.message = Some("next_review_date must not precede review_date".into());
            return Err(err);
        }
    }
    Ok(())
}
