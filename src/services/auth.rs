use std::sync::Arc;

use uuid::Uuid;

use super::UserRepository;
use crate::auth::session::{self, RefreshSessions};
use crate::auth::tokens::{TokenError, TokenService};
use crate::error::AppError;
use crate::models::{User, UserRole, UserStatus};
use crate::repository::user::CreateUser;
use crate::utils::{hash_password, verify_password};

#[derive(Debug)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Failing to sign a token is a server fault, unlike failing to verify one,
/// which the `From<TokenError>` impl reports as 401.
fn issuance_error(e: TokenError) -> AppError {
    AppError::Internal(format!("token issuance failed: {:?}", e))
}

/// Issued token pair plus the authenticated user, returned by register and
/// login.
pub struct IssuedTokens {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<UserRepository>,
    tokens: TokenService,
    sessions: Arc<dyn RefreshSessions>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserRepository>,
        tokens: TokenService,
        sessions: Arc<dyn RefreshSessions>,
    ) -> Self {
        Self {
            users,
            tokens,
            sessions,
        }
    }

    /// Self-registration always lands on the default role.
    pub async fn register(&self, data: RegisterUser) -> Result<IssuedTokens, AppError> {
        if self
            .users
            .store()
            .find_by_email(&data.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&data.password)?;
        let user = self
            .users
            .create(CreateUser {
                email: data.email,
                password_hash,
                first_name: data.first_name,
                last_name: data.last_name,
                role: UserRole::Developer,
            })
            .await?;

        tracing::info!("new user registered: {}", user.id);
        self.issue_session(user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedTokens, AppError> {
        // Absent user and wrong password are reported identically.
        let user = self
            .users
            .store()
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        let matches = match &user.password_hash {
            Some(hash) => verify_password(password, hash)?,
            None => false,
        };
        if !matches {
            tracing::warn!("failed login attempt for {}", email);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        if user.status != UserStatus::Active {
            return Err(AppError::Forbidden("User is inactive".to_string()));
        }

        self.users.store().touch_last_login(user.id).await?;
        self.users.invalidate_entity(user.id).await;
        self.users.invalidate_lists().await;

        tracing::info!("user logged in: {}", user.id);
        self.issue_session(user).await
    }

    /// Mints a new access token against a live refresh session. The refresh
    /// token itself is not rotated.
    pub async fn refresh(&self, presented: &str) -> Result<String, AppError> {
        let user_id = self
            .tokens
            .verify_refresh_token(presented)
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        session::verify_presented(self.sessions.as_ref(), user_id, presented).await?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.status == UserStatus::Active)
            .ok_or_else(|| AppError::Unauthorized("User not found or inactive".to_string()))?;

        self.tokens.issue_access_token(&user).map_err(issuance_error)
    }

    /// Idempotent: succeeds whether or not a session existed.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.sessions.remove(user_id).await?;
        tracing::info!("user logged out: {}", user_id);
        Ok(())
    }

    /// Issues both tokens and overwrites the user's refresh slot, which
    /// invalidates any previously issued refresh token.
    async fn issue_session(&self, user: User) -> Result<IssuedTokens, AppError> {
        let access_token = self
            .tokens
            .issue_access_token(&user)
            .map_err(issuance_error)?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(&user)
            .map_err(issuance_error)?;

        self.sessions.store(user.id, &refresh_token).await?;

        Ok(IssuedTokens {
            user,
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_failures_surface_as_internal_not_unauthorized() {
        assert!(matches!(
            issuance_error(TokenError::Invalid),
            AppError::Internal(_)
        ));
        // Verification failures keep their credential-fault mapping.
        assert!(matches!(
            AppError::from(TokenError::Invalid),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            AppError::from(TokenError::Expired),
            AppError::Unauthorized(_)
        ));
    }
}
