//! JWT issue and validation.
//!
//! Tokens carry the canonical role and the resolved member id, produced
//! once at login. Downstream code only ever sees this typed form.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::Role;

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_minutes: i64,
}

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Canonical role
    pub role: Role,
    /// Resolved member id for anggota callers
    pub member_id: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl TokenClaims {
    pub fn user_id(&self) -> Result<Uuid, anyhow::Error> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow::anyhow!("Invalid subject in token: {}", e))
    }

    pub fn parsed_member_id(&self) -> Result<Option<Uuid>, anyhow::Error> {
        self.member_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid member id in token: {}", e))
    }
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_minutes: config.token_expiry_minutes,
        }
    }

    /// Generate a token for an authenticated user.
    pub fn generate_token(
        &self,
        user_id: Uuid,
        role: Role,
        member_id: Option<Uuid>,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.token_expiry_minutes);

        let claims = TokenClaims {
            sub: user_id.to_string(),
            role,
            member_id: member_id.map(|id| id.to_string()),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))?;

        Ok(token)
    }

    /// Validate a token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
        let data = decode::<TokenClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn service(expiry_minutes: i64) -> JwtService {
        JwtService::new(&AuthConfig {
            jwt_secret: Secret::new("test-secret-do-not-use".to_string()),
            token_expiry_minutes: expiry_minutes,
        })
    }

    #[test]
    fn token_round_trips_with_role_and_member() {
        let svc = service(60);
        let user_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();

        let token = svc
            .generate_token(user_id, Role::Anggota, Some(member_id))
            .unwrap();
        let claims = svc.validate_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, Role::Anggota);
        assert_eq!(claims.parsed_member_id().unwrap(), Some(member_id));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service(-5);
        let token = svc
            .generate_token(Uuid::new_v4(), Role::Kasir, None)
            .unwrap();
        assert!(svc.validate_token(&token).is_err());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let svc = service(60);
        let other = JwtService::new(&AuthConfig {
            jwt_secret: Secret::new("different-secret".to_string()),
            token_expiry_minutes: 60,
        });
        let token = other
            .generate_token(Uuid::new_v4(), Role::Admin, None)
            .unwrap();
        assert!(svc.validate_token(&token).is_err());
    }
}
