//! Migration: Create milestones table

use sea_orm_migration::prelude::*;

use super::m20261001_000002_create_bootcamps::Bootcamps;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Milestones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Milestones::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Milestones::BootcampId).big_integer().not_null())
                    .col(ColumnDef::new(Milestones::Title).string().not_null())
                    .col(ColumnDef::new(Milestones::Description).text().null())
                    .col(ColumnDef::new(Milestones::Order).integer().not_null())
                    .col(
                        ColumnDef::new(Milestones::PercentageWeight)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Milestones::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Milestones::Table, Milestones::BootcampId)
                            .to(Bootcamps::Table, Bootcamps::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Milestones of one bootcamp are totally ordered
        manager
            .create_index(
                Index::create()
                    .name("idx_milestones_bootcamp_order")
                    .table(Milestones::Table)
                    .col(Milestones::BootcampId)
                    .col(Milestones::Order)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Milestones::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Milestones {
    Table,
    Id,
    #[iden = "bootcamp_id"]
    BootcampId,
    Title,
    Description,
    #[iden = "order"]
    Order,
    #[iden = "percentage_weight"]
    PercentageWeight,
    #[iden = "created_at"]
    CreatedAt,
}
