use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::batch::{self, BatchStatus};
use crate::models::bootcamp::{self, BootcampMode};
use crate::models::milestone;

const DEFAULT_BATCH_CAPACITY: i32 = 30;

fn default_capacity() -> i32 {
    DEFAULT_BATCH_CAPACITY
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBootcamp {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub mode: BootcampMode,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[validate(range(min = 1, max = 104))]
    pub duration_weeks: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_batch_dates"))]
pub struct CreateBatch {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, max = 1000))]
    pub capacity: i32,
    pub status: Option<BatchStatus>,
}

fn validate_batch_dates(batch: &CreateBatch) -> Result<(), ValidationError> {
    if batch.end_date < batch.start_date {
        let mut err = ValidationError::new("date_order");
        err.message = Some("end_date must not precede start_date".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMilestone {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub order: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub percentage_weight: i32,
}

/// A bootcamp with its schedule and curriculum
#[derive(Debug, Clone, Serialize)]
pub struct BootcampDetail {
    #[serde(flatten)]
    pub bootcamp: bootcamp::Model,
    pub batches: Vec<batch::Model>,
    pub milestones: Vec<milestone::Model>,
}
