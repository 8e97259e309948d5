use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: DateTimeUtc,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>, // JSON string for flexible data
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    // Authentication
    Login,
    LoginFailed,

    // Users
    UserCreated,

    // Curriculum
    BootcampCreated,
    BatchCreated,
    MilestoneCreated,
    StaffAssigned,
    StaffUnassigned,

    // Enrollment lifecycle
    EnrollmentCreated,
    EnrollmentStatusChanged,
    EnrollmentDeleted,
    MilestoneToggled,
    CertificateIssued,

    // Coursework
    AssignmentCreated,
    AssignmentUpdated,
    AssignmentDeleted,
    SubmissionCreated,
    SubmissionGraded,
    ReviewCreated,

    // CRM
    LeadCreated,
    LeadUpdated,
    LeadConverted,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Login => write!(f, "login"),
            AuditAction::LoginFailed => write!(f, "login_failed"),
            AuditAction::UserCreated => write!(f, "user_created"),
            AuditAction::BootcampCreated => write!(f, "bootcamp_created"),
            AuditAction::BatchCreated => write!(f, "batch_created"),
            AuditAction::MilestoneCreated => write!(f, "milestone_created"),
            AuditAction::StaffAssigned => write!(f, "staff_assigned"),
            AuditAction::StaffUnassigned => write!(f, "staff_unassigned"),
            AuditAction::EnrollmentCreated => write!(f, "enrollment_created"),
            AuditAction::EnrollmentStatusChanged => write!(f, "enrollment_status_changed"),
            AuditAction::EnrollmentDeleted => write!(f, "enrollment_deleted"),
            AuditAction::MilestoneToggled => write!(f, "milestone_toggled"),
            AuditAction::CertificateIssued => write!(f, "certificate_issued"),
            AuditAction::AssignmentCreated => write!(f, "assignment_created"),
            AuditAction::AssignmentUpdated => write!(f, "assignment_updated"),
            AuditAction::AssignmentDeleted => write!(f, "assignment_deleted"),
            AuditAction::SubmissionCreated => write!(f, "submission_created"),
            AuditAction::SubmissionGraded => write!(f, "submission_graded"),
            AuditAction::ReviewCreated => write!(f, "review_created"),
            AuditAction::LeadCreated => write!(f, "lead_created"),
            AuditAction::LeadUpdated => write!(f, "lead_updated"),
            AuditAction::LeadConverted => write!(f, "lead_converted"),
        }
    }
}

// Resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    User,
    Session,
    Bootcamp,
    Batch,
    Milestone,
    Enrollment,
    Certificate,
    Lead,
    Assignment,
    Submission,
    PerformanceReview,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::User => write!(f, "user"),
            ResourceType::Session => write!(f, "session"),
            ResourceType::Bootcamp => write!(f, "bootcamp"),
            ResourceType::Batch => write!(f, "batch"),
            ResourceType::Milestone => write!(f, "milestone"),
            ResourceType::Enrollment => write!(f, "enrollment"),
            ResourceType::Certificate => write!(f, "certificate"),
            ResourceType::Lead => write!(f, "lead"),
            ResourceType::Assignment => write!(f, "assignment"),
            ResourceType::Submission => write!(f, "submission"),
            ResourceType::PerformanceReview => write!(f, "performance_review"),
        }
    }
}
