use std::sync::Arc;

use uuid::Uuid;

use super::UserRepository;
use crate::error::AppError;
use crate::models::{User, UserRole, UserStatus};
use crate::repository::{FindOptions, PaginatedResult};
use crate::repository::user::{UpdateUser, UserFilter};
use crate::utils::hash_password;

/// Self-service profile fields; the password arrives in plaintext and is
/// hashed here before it ever reaches the store.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Paginated listing of active users.
    pub async fn list_users(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<PaginatedResult<User>, AppError> {
        self.repo
            .find_all(FindOptions::page(
                page,
                page_size,
                UserFilter {
                    status: Some(UserStatus::Active),
                    role: None,
                },
            ))
            .await
    }

    pub async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, AppError> {
        self.repo.store().find_by_role(role).await
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, AppError> {
        self.get_user(user_id).await?;

        let password_hash = match changes.password {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        self.repo
            .update(
                user_id,
                UpdateUser {
                    first_name: changes.first_name,
                    last_name: changes.last_name,
                    phone: changes.phone,
                    avatar_url: changes.avatar_url,
                    password_hash,
                    ..UpdateUser::default()
                },
            )
            .await
    }

    pub async fn update_role(&self, user_id: Uuid, role: UserRole) -> Result<User, AppError> {
        self.get_user(user_id).await?;
        self.repo
            .update(
                user_id,
                UpdateUser {
                    role: Some(role),
                    ..UpdateUser::default()
                },
            )
            .await
    }

    pub async fn update_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<User, AppError> {
        self.get_user(user_id).await?;
        self.repo
            .update(
                user_id,
                UpdateUser {
                    status: Some(status),
                    ..UpdateUser::default()
                },
            )
            .await
    }

    /// Soft delete: the row stays, the account is marked inactive.
    pub async fn deactivate(&self, user_id: Uuid) -> Result<(), AppError> {
        self.get_user(user_id).await?;
        self.repo
            .update(
                user_id,
                UpdateUser {
                    status: Some(UserStatus::Inactive),
                    ..UpdateUser::default()
                },
            )
            .await?;
        tracing::info!("user {} deactivated", user_id);
        Ok(())
    }
}
