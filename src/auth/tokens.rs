use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{User, UserRole};

/// Fixed issuer claim stamped into every access token.
pub const ISSUER: &str = "sgps-api";

pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Expiry is distinguished from every other verification failure so clients
/// can react differently (e.g. trigger a silent refresh); both still map to
/// a 401 at the boundary.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

struct Keys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_validation: Validation,
    refresh_validation: Validation,
}

/// Issues and verifies the two token classes. Access and refresh tokens are
/// signed with independent secrets; the algorithm is pinned to HS256 on both
/// the signing and the verification path.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
}

impl TokenService {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        let mut access_validation = Validation::new(Algorithm::HS256);
        access_validation.set_issuer(&[ISSUER]);

        let refresh_validation = Validation::new(Algorithm::HS256);

        Self {
            keys: Arc::new(Keys {
                access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
                access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
                refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
                refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
                access_validation,
                refresh_validation,
            }),
        }
    }

    /// Stateless, short-lived credential carrying identity and role.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iss: ISSUER.to_string(),
            iat: now,
            exp: now + ACCESS_TOKEN_TTL_SECS,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.access_encoding,
        )
        .map_err(|_| TokenError::Invalid)
    }

    /// Long-lived credential asserting only the subject id plus a
    /// discriminator so it can never be replayed as an access token.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user.id,
            token_type: "refresh".to_string(),
            iat: now,
            exp: now + REFRESH_TOKEN_TTL_SECS,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.refresh_encoding,
        )
        .map_err(|_| TokenError::Invalid)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(
            token,
            &self.keys.access_decoding,
            &self.keys.access_validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }

    /// Expiry and tamper are deliberately not distinguished here; the refresh
    /// flow reports a single failure mode outward.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<RefreshClaims>(
            token,
            &self.keys.refresh_decoding,
            &self.keys.refresh_validation,
        )
        .map_err(|_| TokenError::Invalid)?;

        if data.claims.token_type != "refresh" {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            password_hash: None,
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            role: UserRole::Developer,
            status: UserStatus::Active,
            avatar_url: None,
            phone: None,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service() -> TokenService {
        TokenService::new("access-secret", "refresh-secret")
    }

    #[test]
    fn access_token_round_trip_preserves_identity() {
        let svc = service();
        let user = sample_user();

        let token = svc.issue_access_token(&user).unwrap();
        let claims = svc.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, UserRole::Developer);
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn expired_access_token_fails_with_expired() {
        let svc = service();
        let user = sample_user();
        let now = Utc::now().timestamp();

        // Validly signed, but past expiry beyond the verification leeway.
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iss: ISSUER.to_string(),
            iat: now - 3600,
            exp: now - 3000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"access-secret"),
        )
        .unwrap();

        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_access_token_fails_with_invalid() {
        let svc = service();
        let token = svc.issue_access_token(&sample_user()).unwrap();

        let mut tampered = token;
        tampered.push('x');

        assert_eq!(
            svc.verify_access_token(&tampered),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn access_token_signed_with_wrong_secret_is_invalid() {
        let svc = service();
        let other = TokenService::new("other-secret", "refresh-secret");

        let token = other.issue_access_token(&sample_user()).unwrap();
        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn refresh_token_round_trip_returns_subject() {
        let svc = service();
        let user = sample_user();

        let token = svc.issue_refresh_token(&user).unwrap();
        assert_eq!(svc.verify_refresh_token(&token).unwrap(), user.id);
    }

    #[test]
    fn token_classes_are_not_interchangeable() {
        let svc = service();
        let user = sample_user();

        let access = svc.issue_access_token(&user).unwrap();
        let refresh = svc.issue_refresh_token(&user).unwrap();

        // Signed with different secrets and different claim shapes.
        assert_eq!(svc.verify_refresh_token(&access), Err(TokenError::Invalid));
        assert_eq!(svc.verify_access_token(&refresh), Err(TokenError::Invalid));
    }
}
