pub mod auth;
pub mod permissions;
pub mod security_headers;

pub use auth::require_auth;
pub use auth::AuthenticatedUser;
pub use permissions::{Authenticated, Authorized};
pub use security_headers::add_security_headers;
