use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::user::{self, UserRole};

/// Random bytes in a certificate verification code
const VERIFICATION_CODE_BYTES: usize = 16;

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub iss: String, // Issuer
    pub role: UserRole,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
    pub jti: String,
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, CONFIG.auth.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Create a signed access token for a user
pub fn create_access_token(user: &user::Model) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(CONFIG.auth.access_token_ttl);

    let claims = Claims {
        sub: user.id.to_string(),
        iss: CONFIG.auth.jwt_issuer.clone(),
        role: user.role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(CONFIG.auth.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| e.into())
}

/// Decode and validate a JWT token
pub fn decode_token(token: &str) -> Result<Claims> {
    let key = DecodingKey::from_secret(CONFIG.auth.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[CONFIG.auth.jwt_issuer.as_str()]);
    // No clock skew tolerance for expiration check
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}

/// Generate a certificate verification code: 16 random bytes, uppercase hex.
pub fn generate_verification_code() -> String {
    let mut bytes = [0u8; VERIFICATION_CODE_BYTES];
    rand::rng().fill(&mut bytes[..]);
    hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: 42,
            email: "ada@example.com".to_string(),
            full_name: "Ada Lovelace".to_string(),
            phone: None,
            hashed_password: String::new(),
            role: UserRole::Instructor,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_token_round_trip_keeps_subject_and_role() {
        let token = create_access_token(&sample_user()).unwrap();
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, UserRole::Instructor);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let mut token = create_access_token(&sample_user()).unwrap();
        token.push('x');
        assert!(decode_token(&token).is_err());
    }

    #[test]
    fn test_verification_code_format() {
        let code = generate_verification_code();
        assert_eq!(code.len(), VERIFICATION_CODE_BYTES * 2);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_verification_codes_differ() {
        let codes: std::collections::HashSet<String> =
            (0..64).map(|_| generate_verification_code()).collect();
        assert_eq!(codes.len(), 64);
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = bcrypt::hash("s3cret-pass", 4).unwrap();
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong", &hash));
    }
}
