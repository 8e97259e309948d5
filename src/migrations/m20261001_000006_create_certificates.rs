//! Migration: Create certificates table

use sea_orm_migration::prelude::*;

use super::m20261001_000004_create_enrollments::Enrollments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // One certificate per enrollment; concurrent issuance races end here
                    .col(
                        ColumnDef::new(Certificates::EnrollmentId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Certificates::VerificationCode)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Certificates::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificates::CertificateUrl).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Certificates::Table, Certificates::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificates::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum Certificates {
    Table,
    Id,
    #[iden = "enrollment_id"]
    EnrollmentId,
    #[iden = "verification_code"]
    VerificationCode,
    #[iden = "issued_at"]
    IssuedAt,
    #[iden = "certificate_url"]
    CertificateUrl,
}
