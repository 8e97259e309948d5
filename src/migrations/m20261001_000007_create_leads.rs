//! Migration: Create leads and lead_logs tables

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
                    .table(Leads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Leads::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Leads::FullName).string().not_null())
                    .col(ColumnDef::new(Leads::Email).string().not_null())
                    .col(ColumnDef::new(Leads::Phone).string().null())
                    .col(ColumnDef::new(Leads::Source).string().null())
                    .col(ColumnDef::new(Leads::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Leads::AssignedToId).big_integer().null())
                    .col(ColumnDef::new(Leads::ConvertedToUserId).big_integer().null())
                    .col(
                        ColumnDef::new(Leads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Leads::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Leads::Table, Leads::AssignedToId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Leads::Table, Leads::ConvertedToUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leads_email")
                    .table(Leads::Table)
                    .col(Leads::Email)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leads_assigned_to")
                    .table(Leads::Table)
                    .col(Leads::AssignedToId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeadLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeadLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeadLogs::LeadId).big_integer().not_null())
                    .col(ColumnDef::new(LeadLogs::Note).text().not_null())
                    .col(
                        ColumnDef::new(LeadLogs::NextFollowUp)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(LeadLogs::CreatedById).big_integer().null())
                    .col(
                        ColumnDef::new(LeadLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LeadLogs::Table, LeadLogs::LeadId)
                            .to(Leads::Table, Leads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LeadLogs::Table, LeadLogs::CreatedById)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeadLogs::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Leads::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum Leads {
    Table,
    Id,
    #[iden = "full_name"]
    FullName,
    Email,
    Phone,
    Source,
    Status,
    #[iden = "assigned_to_id"]
    AssignedToId,
    #[iden = "converted_to_user_id"]
    ConvertedToUserId,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

#[derive(Iden)]
#[iden = "lead_logs"]
enum LeadLogs {
    Table,
    Id,
    #[iden = "lead_id"]
    LeadId,
    Note,
    #[iden = "next_follow_up"]
    NextFollowUp,
    #[iden = "created_by_id"]
    CreatedById,
    #[iden = "created_at"]
    CreatedAt,
}
