//! Migration: Create performance_reviews table

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;
use super::m20261001_000004_create_enrollments::Enrollments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PerformanceReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PerformanceReviews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PerformanceReviews::EnrollmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PerformanceReviews::ReviewerId).big_integer().null())
                    .col(ColumnDef::new(PerformanceReviews::TechnicalSkills).integer().null())
                    .col(ColumnDef::new(PerformanceReviews::SoftSkills).integer().null())
                    .col(ColumnDef::new(PerformanceReviews::Attendance).integer().null())
                    .col(ColumnDef::new(PerformanceReviews::Participation).integer().null())
                    .col(ColumnDef::new(PerformanceReviews::Strengths).text().null())
                    .col(
                        ColumnDef::new(PerformanceReviews::AreasForImprovement)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(PerformanceReviews::ActionPlan).text().null())
                    .col(ColumnDef::new(PerformanceReviews::ReviewDate).date().not_null())
                    .col(ColumnDef::new(PerformanceReviews::NextReviewDate).date().null())
                    .col(
                        ColumnDef::new(PerformanceReviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PerformanceReviews::Table, PerformanceReviews::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PerformanceReviews::Table, PerformanceReviews::ReviewerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_performance_reviews_enrollment")
                    .table(PerformanceReviews::Table)
                    .col(PerformanceReviews::EnrollmentId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PerformanceReviews::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum PerformanceReviews {
    Table,
    Id,
    #[iden = "enrollment_id"]
    EnrollmentId,
    #[iden = "reviewer_id"]
    ReviewerId,
    #[iden = "technical_skills"]
    TechnicalSkills,
    #[iden = "soft_skills"]
    SoftSkills,
    Attendance,
    Participation,
    Strengths,
    #[iden = "areas_for_improvement"]
    AreasForImprovement,
    #[iden = "action_plan"]
    ActionPlan,
    #[iden = "review_date"]
    ReviewDate,
    #[iden = "next_review_date"]
    NextReviewDate,
    #[iden = "created_at"]
    CreatedAt,
}
