//! Role policies with type-safe authorization extractors
//!
//! Every operation has exactly one entry in [`POLICIES`] naming the roles
//! that may perform it and the ownership rule applied once the target
//! resource is loaded. Roles never inherit from each other.
//!
//! Usage in handlers:
//! ```ignore
//! use crate::middleware::{Authorized, permissions::*};
//!
//! async fn toggle_milestone(
//!     auth: Authorized<MilestoneToggle>,
//!     State(state): State<AppState>,
//!     Path((id, milestone_id)): Path<(i64, i64)>,
//! ) -> Result<Json<ToggleOutcome>> {
//!     let enrollment = enrollment::get(&state.db, id).await?;
//!     auth.ensure_enrollment_access(&state.db, &enrollment).await?;
//!     // ...
//! }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::enrollment;
use crate::models::user::{self, UserRole};
use crate::services::staff;

/// Operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    EnrollmentCreate,
    EnrollmentList,
    EnrollmentView,
    EnrollmentUpdateStatus,
    EnrollmentDelete,
    MilestoneToggle,
    ProgressView,
    CertificateView,
    CertificateIssue,
    CurriculumView,
    CurriculumManage,
    MilestoneManage,
    LeadCreate,
    LeadView,
    LeadUpdate,
    LeadConvert,
    UsersView,
    UsersManage,
    AuditView,
    BatchStaffManage,
    AssignmentView,
    AssignmentManage,
    SubmissionCreate,
    SubmissionView,
    SubmissionGrade,
    ReviewCreate,
    ReviewView,
}

/// Ownership rule checked against the loaded resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Role check only
    None,
    /// Students must own the enrollment, instructors and mentors must be
    /// assigned to its batch; admins and sales pass
    OwnEnrollment,
    /// Students may only act on themselves
    SelfOnly,
    /// Everyone but admins must be the lead's assignee
    AssignedLead,
    /// Instructors and mentors must staff a batch of the bootcamp
    BootcampStaff,
}

/// How far a user's reach extends under a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Only resources owned by this user id
    Own(i64),
    /// Only resources in batches this staff member is assigned to
    Staff(i64),
}

impl Scope {
    pub fn owner(&self) -> Option<i64> {
        match self {
            Scope::Own(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub operation: Operation,
    pub roles: &'static [UserRole],
    pub ownership: Ownership,
}

use UserRole::{Admin, Instructor, Mentor, Sales, Student};

const EVERYONE: &[UserRole] = &UserRole::ALL;

pub const POLICIES: &[Policy] = &[
    Policy {
        operation: Operation::EnrollmentCreate,
        roles: &[Admin, Sales, Student],
        ownership: Ownership::SelfOnly,
    },
    Policy {
        operation: Operation::EnrollmentList,
        roles: EVERYONE,
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::EnrollmentView,
        roles: EVERYONE,
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::EnrollmentUpdateStatus,
        roles: &[Admin, Sales, Instructor],
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::EnrollmentDelete,
        roles: &[Admin],
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::MilestoneToggle,
        roles: &[Admin, Instructor],
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::ProgressView,
        roles: &[Admin, Instructor, Mentor, Student],
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::CertificateView,
        roles: &[Admin, Instructor, Student],
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::CertificateIssue,
        roles: &[Admin, Instructor, Student],
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::CurriculumView,
        roles: EVERYONE,
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::CurriculumManage,
        roles: &[Admin],
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::MilestoneManage,
        roles: &[Admin, Instructor],
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::LeadCreate,
        roles: &[Admin, Sales],
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::LeadView,
        roles: &[Admin, Sales],
        ownership: Ownership::AssignedLead,
    },
    Policy {
        operation: Operation::LeadUpdate,
        roles: &[Admin, Sales],
        ownership: Ownership::AssignedLead,
    },
    Policy {
        operation: Operation::LeadConvert,
        roles: &[Admin, Sales],
        ownership: Ownership::AssignedLead,
    },
    Policy {
        operation: Operation::UsersView,
        roles: &[Admin, Sales, Instructor, Mentor],
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::UsersManage,
        roles: &[Admin],
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::AuditView,
        roles: &[Admin],
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::BatchStaffManage,
        roles: &[Admin],
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::AssignmentView,
        roles: EVERYONE,
        ownership: Ownership::None,
    },
    Policy {
        operation: Operation::AssignmentManage,
        roles: &[Admin, Instructor],
        ownership: Ownership::BootcampStaff,
    },
    Policy {
        operation: Operation::SubmissionCreate,
        roles: &[Student],
        ownership: Ownership::SelfOnly,
    },
    Policy {
        operation: Operation::SubmissionView,
        roles: &[Admin, Instructor, Mentor, Student],
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::SubmissionGrade,
        roles: &[Admin, Instructor, Mentor],
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::ReviewCreate,
        roles: &[Admin, Instructor],
        ownership: Ownership::OwnEnrollment,
    },
    Policy {
        operation: Operation::ReviewView,
        roles: &[Admin, Instructor, Mentor, Student],
        ownership: Ownership::OwnEnrollment,
    },
];

/// Look up the policy for an operation
pub fn policy_for(operation: Operation) -> Option<&'static Policy> {
    POLICIES.iter().find(|p| p.operation == operation)
}

impl Policy {
    pub fn allows_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    /// Resolve the ownership rule for this user
    pub fn scope_for(&self, user: &user::Model) -> Scope {
        match (self.ownership, user.role) {
            (Ownership::None, _) => Scope::All,
            (Ownership::OwnEnrollment | Ownership::SelfOnly, Student) => Scope::Own(user.id),
            (Ownership::OwnEnrollment | Ownership::BootcampStaff, Instructor | Mentor) => {
                Scope::Staff(user.id)
            }
            (Ownership::AssignedLead, role) if role != Admin => Scope::Own(user.id),
            _ => Scope::All,
        }
    }

    /// Apply the ownership rule to a resource owned by `owner_id`.
    /// A staff scope cannot be decided from an owner id alone and is denied.
    pub fn permits_owner(&self, user: &user::Model, owner_id: Option<i64>) -> bool {
        match self.scope_for(user) {
            Scope::All => true,
            Scope::Own(id) => owner_id == Some(id),
            Scope::Staff(_) => false,
        }
    }
}

/// Role check for an operation. Unknown operations are denied.
pub fn authorize(user: &user::Model, operation: Operation) -> Result<&'static Policy> {
    let policy = policy_for(operation)
        .ok_or_else(|| AppError::Forbidden(format!("No policy for {:?}", operation)))?;

    if !policy.allows_role(user.role) {
        tracing::debug!(
            user_id = user.id,
            role = %user.role,
            ?operation,
            "Role not permitted"
        );
        return Err(AppError::Forbidden(format!(
            "Role {} may not perform {:?}",
            user.role, operation
        )));
    }

    Ok(policy)
}

/// Trait for permission marker types
pub trait Permission: Send + Sync + 'static {
    const OPERATION: Operation;
}

/// Macro to define permission types
///
/// Creates zero-sized marker types that implement `Permission`, each bound
/// to the `Operation` variant of the same name.
macro_rules! define_permissions {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Permission for $name {
                const OPERATION: Operation = Operation::$name;
            }
        )*
    };
}

define_permissions! {
    // Enrollments
    /// Enroll a student into a batch
    EnrollmentCreate,
    EnrollmentList,
    EnrollmentView,
    /// Move an enrollment through its workflow
    EnrollmentUpdateStatus,
    EnrollmentDelete,

    // Progress and certificates
    /// Mark a milestone complete or incomplete
    MilestoneToggle,
    ProgressView,
    CertificateView,
    CertificateIssue,

    // Curriculum
    CurriculumView,
    /// Create bootcamps and batches
    CurriculumManage,
    MilestoneManage,

    // Sales
    LeadCreate,
    LeadView,
    LeadUpdate,
    /// Turn a lead into a student account
    LeadConvert,

    // Users and audit
    UsersView,
    UsersManage,
    AuditView,

    // Staffing, coursework and reviews
    /// Attach instructors and mentors to batches
    BatchStaffManage,
    AssignmentView,
    AssignmentManage,
    SubmissionCreate,
    SubmissionView,
    SubmissionGrade,
    ReviewCreate,
    ReviewView,
}

fn access_denied() -> AppError {
    AppError::Forbidden("You do not have access to this resource".to_string())
}

/// Extractor that requires the role policy of `P`
///
/// The role check runs before the handler. The ownership rule needs the
/// target resource, so handlers call one of the `ensure_*` methods once it
/// is loaded.
#[derive(Debug, Clone)]
pub struct Authorized<P: Permission>(pub user::Model, &'static Policy, PhantomData<P>);

impl<P: Permission> Authorized<P> {
    /// Get the authenticated user
    pub fn user(&self) -> &user::Model {
        &self.0
    }

    /// Get the user ID
    pub fn user_id(&self) -> i64 {
        self.0.id
    }

    pub fn policy(&self) -> &'static Policy {
        self.1
    }

    /// The restriction list queries must apply
    pub fn scope(&self) -> Scope {
        self.1.scope_for(&self.0)
    }

    /// Enforce the ownership rule against the resource owner
    pub fn ensure_owner(&self, owner_id: impl Into<Option<i64>>) -> Result<()> {
        if self.1.permits_owner(&self.0, owner_id.into()) {
            Ok(())
        } else {
            Err(access_denied())
        }
    }

    /// Enforce the ownership rule against an enrollment
    pub async fn ensure_enrollment_access(
        &self,
        db: &DbConn,
        enrollment: &enrollment::Model,
    ) -> Result<()> {
        let allowed = match self.scope() {
            Scope::All => true,
            Scope::Own(id) => enrollment.student_id == id,
            Scope::Staff(id) => staff::is_assigned(db, enrollment.batch_id, id).await?,
        };
        if allowed {
            Ok(())
        } else {
            Err(access_denied())
        }
    }

    /// Enforce the ownership rule against a student's work in a bootcamp
    pub async fn ensure_student_access(
        &self,
        db: &DbConn,
        student_id: i64,
        bootcamp_id: i64,
    ) -> Result<()> {
        let allowed = match self.scope() {
            Scope::All => true,
            Scope::Own(id) => student_id == id,
            Scope::Staff(id) => staff::covers_student(db, id, student_id, bootcamp_id).await?,
        };
        if allowed {
            Ok(())
        } else {
            Err(access_denied())
        }
    }

    /// Enforce the ownership rule against a bootcamp
    pub async fn ensure_bootcamp_access(&self, db: &DbConn, bootcamp_id: i64) -> Result<()> {
        let allowed = match self.scope() {
            Scope::All => true,
            Scope::Own(_) => false,
            Scope::Staff(id) => staff::teaches_bootcamp(db, id, bootcamp_id).await?,
        };
        if allowed {
            Ok(())
        } else {
            Err(access_denied())
        }
    }
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: Permission,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let auth_user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let policy = authorize(&auth_user.0, P::OPERATION)?;

        Ok(Authorized(auth_user.0.clone(), policy, PhantomData))
    }
}

/// Extractor for any authenticated user (no specific permission required)
#[derive(Debug, Clone)]
pub struct Authenticated(pub user::Model);

impl Authenticated {
    /// Get the authenticated user
    pub fn user(&self) -> &user::Model {
        &self.0
    }

    /// Get the user ID
    pub fn user_id(&self) -> i64 {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let auth_user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        Ok(Authenticated(auth_user.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const ALL_OPERATIONS: [Operation; 27] = [
        Operation::EnrollmentCreate,
        Operation::EnrollmentList,
        Operation::EnrollmentView,
        Operation::EnrollmentUpdateStatus,
        Operation::EnrollmentDelete,
        Operation::MilestoneToggle,
        Operation::ProgressView,
        Operation::CertificateView,
        Operation::CertificateIssue,
        Operation::CurriculumView,
        Operation::CurriculumManage,
        Operation::MilestoneManage,
        Operation::LeadCreate,
        Operation::LeadView,
        Operation::LeadUpdate,
        Operation::LeadConvert,
        Operation::UsersView,
        Operation::UsersManage,
        Operation::AuditView,
        Operation::BatchStaffManage,
        Operation::AssignmentView,
        Operation::AssignmentManage,
        Operation::SubmissionCreate,
        Operation::SubmissionView,
        Operation::SubmissionGrade,
        Operation::ReviewCreate,
        Operation::ReviewView,
    ];

    fn user_with_role(id: i64, role: UserRole) -> user::Model {
        let now = Utc::now();
        user::Model {
            id,
            email: format!("user{}@example.com", id),
            full_name: format!("User {}", id),
            phone: None,
            hashed_password: String::new(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_every_operation_has_exactly_one_policy() {
        for op in ALL_OPERATIONS {
            let count = POLICIES.iter().filter(|p| p.operation == op).count();
            assert_eq!(count, 1, "{:?} should have one policy", op);
        }
        assert_eq!(POLICIES.len(), ALL_OPERATIONS.len());
    }

    #[test]
    fn test_mentor_cannot_toggle_milestones() {
        let mentor = user_with_role(1, Mentor);
        assert!(authorize(&mentor, Operation::MilestoneToggle).is_err());
        assert!(authorize(&mentor, Operation::ProgressView).is_ok());
    }

    #[test]
    fn test_sales_cannot_view_progress_or_certificates() {
        let sales = user_with_role(1, Sales);
        assert!(authorize(&sales, Operation::ProgressView).is_err());
        assert!(authorize(&sales, Operation::CertificateView).is_err());
        assert!(authorize(&sales, Operation::EnrollmentCreate).is_ok());
    }

    #[test]
    fn test_only_admin_deletes_enrollments() {
        for role in UserRole::ALL {
            let user = user_with_role(1, role);
            let allowed = authorize(&user, Operation::EnrollmentDelete).is_ok();
            assert_eq!(allowed, role == Admin, "{}", role);
        }
    }

    #[test]
    fn test_only_staff_toggle_milestones() {
        for role in UserRole::ALL {
            let user = user_with_role(1, role);
            let allowed = authorize(&user, Operation::MilestoneToggle).is_ok();
            assert_eq!(allowed, matches!(role, Admin | Instructor), "{}", role);
        }
    }

    #[test]
    fn test_student_restricted_to_own_enrollment() {
        let student = user_with_role(7, Student);
        let policy = authorize(&student, Operation::ProgressView).unwrap();
        assert_eq!(policy.scope_for(&student), Scope::Own(7));
        assert!(policy.permits_owner(&student, Some(7)));
        assert!(!policy.permits_owner(&student, Some(8)));
    }

    #[test]
    fn test_instructors_and_mentors_get_staff_scope() {
        let instructor = user_with_role(3, Instructor);
        let mentor = user_with_role(4, Mentor);
        let policy = policy_for(Operation::ProgressView).unwrap();
        assert_eq!(policy.scope_for(&instructor), Scope::Staff(3));
        assert_eq!(policy.scope_for(&mentor), Scope::Staff(4));
        // staff reach is decided by batch assignment, never by owner id
        assert!(!policy.permits_owner(&instructor, Some(3)));
    }

    #[test]
    fn test_admin_is_unscoped() {
        let admin = user_with_role(1, Admin);
        for policy in POLICIES {
            assert_eq!(policy.scope_for(&admin), Scope::All, "{:?}", policy.operation);
        }
    }

    #[test]
    fn test_grading_and_reviews_are_staff_only() {
        let student = user_with_role(1, Student);
        let mentor = user_with_role(2, Mentor);
        assert!(authorize(&student, Operation::SubmissionGrade).is_err());
        assert!(authorize(&mentor, Operation::SubmissionGrade).is_ok());
        assert!(authorize(&mentor, Operation::ReviewCreate).is_err());
        assert!(authorize(&student, Operation::ReviewView).is_ok());
        assert!(authorize(&mentor, Operation::SubmissionCreate).is_err());
    }

    #[test]
    fn test_sales_restricted_to_assigned_leads() {
        let sales = user_with_role(4, Sales);
        let admin = user_with_role(5, Admin);
        let policy = policy_for(Operation::LeadView).unwrap();
        assert_eq!(policy.scope_for(&sales), Scope::Own(4));
        assert!(policy.permits_owner(&sales, Some(4)));
        assert!(!policy.permits_owner(&sales, Some(6)));
        assert!(!policy.permits_owner(&sales, None));
        assert!(policy.permits_owner(&admin, None));
    }
}
