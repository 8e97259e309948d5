//! Migration: Create batch_staff table (instructor and mentor assignments)

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;
use super::m20261001_000002_create_bootcamps::Batches;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BatchStaff::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BatchStaff::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BatchStaff::BatchId).big_integer().not_null())
                    .col(ColumnDef::new(BatchStaff::UserId).big_integer().not_null())
                    .col(ColumnDef::new(BatchStaff::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(BatchStaff::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BatchStaff::Table, BatchStaff::BatchId)
                            .to(Batches::Table, Batches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BatchStaff::Table, BatchStaff::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_batch_staff_batch_user")
                    .table(BatchStaff::Table)
                    .col(BatchStaff::BatchId)
                    .col(BatchStaff::UserId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_batch_staff_user")
                    .table(BatchStaff::Table)
                    .col(BatchStaff::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BatchStaff::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "batch_staff"]
enum BatchStaff {
    Table,
    Id,
    #[iden = "batch_id"]
    BatchId,
    #[iden = "user_id"]
    UserId,
    Role,
    #[iden = "assigned_at"]
    AssignedAt,
}
