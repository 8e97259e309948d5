pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_bootcamps;
mod m20261001_000003_create_milestones;
mod m20261001_000004_create_enrollments;
mod m20261001_000005_create_student_milestones;
mod m20261001_000006_create_certificates;
mod m20261001_000007_create_leads;
mod m20261001_000008_create_audit_logs;
mod m20261001_000009_create_batch_staff;
mod m20261001_000010_create_assignments;
mod m20261001_000011_create_performance_reviews;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_bootcamps::Migration),
            Box::new(m20261001_000003_create_milestones::Migration),
            Box::new(m20261001_000004_create_enrollments::Migration),
            Box::new(m20261001_000005_create_student_milestones::Migration),
            Box::new(m20261001_000006_create_certificates::Migration),
            Box::new(m20261001_000007_create_leads::Migration),
            Box::new(m20261001_000008_create_audit_logs::Migration),
            Box::new(m20261001_000009_create_batch_staff::Migration),
            Box::new(m20261001_000010_create_assignments::Migration),
            Box::new(m20261001_000011_create_performance_reviews::Migration),
        ]
    }
}
