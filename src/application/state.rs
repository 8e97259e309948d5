use crate::services::audit::AuditService;

pub use crate::db::DbConn;

/// Application state containing all shared resources
///
/// Handlers are stateless; everything that outlives a request lives in the
/// database behind this connection pool.
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub audit: AuditService,
}

impl AppState {
    pub fn new(db: DbConn) -> Self {
        let audit = AuditService::new(db.clone());
        Self { db, audit }
    }
}
