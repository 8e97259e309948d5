//! Migration: Create bootcamps and batches tables

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bootcamps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bootcamps::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bootcamps::Title).string().not_null())
                    .col(ColumnDef::new(Bootcamps::Description).text().not_null())
                    .col(ColumnDef::new(Bootcamps::Mode).string_len(16).not_null())
                    .col(ColumnDef::new(Bootcamps::PriceCents).big_integer().not_null())
                    .col(ColumnDef::new(Bootcamps::DurationWeeks).integer().not_null())
                    .col(ColumnDef::new(Bootcamps::CreatedById).big_integer().null())
                    .col(
                        ColumnDef::new(Bootcamps::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Bootcamps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bootcamps::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Bootcamps::Table, Bootcamps::CreatedById)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Batches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Batches::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Batches::BootcampId).big_integer().not_null())
                    .col(ColumnDef::new(Batches::Name).string().not_null())
                    .col(ColumnDef::new(Batches::StartDate).date().not_null())
                    .col(ColumnDef::new(Batches::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Batches::Capacity)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(ColumnDef::new(Batches::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Batches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Batches::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Batches::Table, Batches::BootcampId)
                            .to(Bootcamps::Table, Bootcamps::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_batches_bootcamp")
                    .table(Batches::Table)
                    .col(Batches::BootcampId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Batches::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bootcamps::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bootcamps {
    Table,
    Id,
    Title,
    Description,
    Mode,
    #[iden = "price_cents"]
    PriceCents,
    #[iden = "duration_weeks"]
    DurationWeeks,
    #[iden = "created_by_id"]
    CreatedById,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

#[derive(Iden)]
pub enum Batches {
    Table,
    Id,
    #[iden = "bootcamp_id"]
    BootcampId,
    Name,
    #[iden = "start_date"]
    StartDate,
    #[iden = "end_date"]
    EndDate,
    Capacity,
    Status,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
