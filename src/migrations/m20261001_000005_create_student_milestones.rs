//! Migration: Create student_milestones table

use sea_orm_migration::prelude::*;

use super::m20261001_000003_create_milestones::Milestones;
use super::m20261001_000004_create_enrollments::Enrollments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StudentMilestones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentMilestones::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentMilestones::EnrollmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentMilestones::MilestoneId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentMilestones::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StudentMilestones::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentMilestones::Table, StudentMilestones::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentMilestones::Table, StudentMilestones::MilestoneId)
                            .to(Milestones::Table, Milestones::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_student_milestones_enrollment_milestone")
                    .table(StudentMilestones::Table)
                    .col(StudentMilestones::EnrollmentId)
                    .col(StudentMilestones::MilestoneId)
                    .unique()
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
                    .table(StudentMilestones::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "student_milestones"]
enum StudentMilestones {
    Table,
    Id,
    #[iden = "enrollment_id"]
    EnrollmentId,
    #[iden = "milestone_id"]
    MilestoneId,
    Completed,
    #[iden = "completed_at"]
    CompletedAt,
}
