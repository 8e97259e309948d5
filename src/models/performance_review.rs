use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Periodic staff assessment of a student within one enrollment.
/// Skill scores are on a 1..=10 scale.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "performance_reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub enrollment_id: i64,
    pub reviewer_id: Option<i64>,
    pub technical_skills: Option<i32>,
    pub soft_skills: Option<i32>,
    pub attendance: Option<i32>,
    pub participation: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub strengths: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub areas_for_improvement: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub action_plan: Option<String>,
    pub review_date: Date,
    pub next_review_date: Option<Date>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enrollment::Entity",
        from = "Column::EnrollmentId",
        to = "super::enrollment::Column::Id",
        on_delete = "Cascade"
    )]
    Enrollment,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReviewerId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Reviewer,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
