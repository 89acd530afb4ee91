//! JWT session tokens for administrator accounts.
//!
//! Grounded near-verbatim in the teacher's
//! `router-api/src/api/users/helper/auth_token.rs`: a random signing key
//! generated once per process (so a restart forces re-login), HS256
//! tokens carrying `{sub, username, role, exp, iat}`.

use std::sync::LazyLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, errors::Error as JwtError, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use waf_core::store::User;

static GLOBAL_SECRET: LazyLock<String> = LazyLock::new(|| {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
});

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub exp: u64,
    pub iat: u64,
}

pub struct AuthConfig {
    secret_key: String,
    token_validity: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: GLOBAL_SECRET.clone(),
            token_validity: Duration::from_secs(60 * 60),
        }
    }
}

pub fn generate_token(user: &User, config: &AuthConfig) -> Result<String, JwtError> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let claims = Claims {
        sub: user.id.clone(),
        username: user.username.clone(),
        role: user.role.as_str().to_string(),
        exp: now + config.token_validity.as_secs(),
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(config.secret_key.as_bytes()))
}

pub fn validate_token(token: &str, config: &AuthConfig) -> Result<Claims, JwtError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(config.secret_key.as_bytes()), &validation)?;
    Ok(data.claims)
}

pub fn is_admin(role: &str) -> bool {
    role == "admin"
}

pub fn is_staff_or_admin(role: &str) -> bool {
    role == "admin" || role == "staff"
}

/// Admins and staff can modify any account; regular users only themselves.
pub fn can_modify_user(user_id: &str, user_role: &str, target_id: &str) -> bool {
    is_staff_or_admin(user_role) || user_id == target_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use waf_core::store::Role;

    #[test]
    fn generated_token_round_trips() {
        let config = AuthConfig::default();
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "a@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
        };
        let token = generate_token(&user, &config).unwrap();
        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn rejects_token_from_a_different_key() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "a@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
        };
        let token = generate_token(&user, &AuthConfig::default()).unwrap();
        let other_config = AuthConfig {
            secret_key: "a-completely-different-secret".to_string(),
            token_validity: Duration::from_secs(60),
        };
        assert!(validate_token(&token, &other_config).is_err());
    }
}
