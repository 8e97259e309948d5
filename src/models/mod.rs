pub mod assignment;
pub mod audit_log;
pub mod batch;
pub mod batch_staff;
pub mod bootcamp;
pub mod certificate;
pub mod enrollment;
pub mod grade;
pub mod lead;
pub mod lead_log;
pub mod milestone;
pub mod performance_review;
pub mod student_milestone;
pub mod submission;
pub mod user;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::assignment::{self, Entity as Assignment};
    pub use super::audit_log::{self, Entity as AuditLog};
    pub use super::batch::{self, Entity as Batch};
    pub use super::batch_staff::{self, Entity as BatchStaff};
    pub use super::bootcamp::{self, Entity as Bootcamp};
    pub use super::certificate::{self, Entity as Certificate};
    pub use super::enrollment::{self, Entity as Enrollment};
    pub use super::grade::{self, Entity as Grade};
    pub use super::lead::{self, Entity as Lead};
    pub use super::lead_log::{self, Entity as LeadLog};
    pub use super::milestone::{self, Entity as Milestone};
    pub use super::performance_review::{self, Entity as PerformanceReview};
    pub use super::student_milestone::{self, Entity as StudentMilestone};
    pub use super::submission::{self, Entity as Submission};
    pub use super::user::{self, Entity as User};
}
