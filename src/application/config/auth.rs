use std::env;

/// Secret used when `COHORTLY_JWT_SECRET` is unset. Only fit for local development.
pub const DEV_JWT_SECRET: &str = "cohortly-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Access token lifetime in seconds
    pub access_token_ttl: i64,
    pub bcrypt_cost: u32,
    /// Bootstrap admin account, created on startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: env::var("COHORTLY_JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            jwt_issuer: env::var("COHORTLY_JWT_ISSUER").unwrap_or_else(|_| "cohortly".to_string()),
            access_token_ttl: env::var("COHORTLY_ACCESS_TOKEN_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            bcrypt_cost: env::var("COHORTLY_BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
            admin_email: env::var("COHORTLY_ADMIN_EMAIL").ok().filter(|s| !s.is_empty()),
            admin_password: env::var("COHORTLY_ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
