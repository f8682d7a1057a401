use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use uuid::Uuid;

use crate::auth::tokens::REFRESH_TOKEN_TTL_SECS;
use crate::cache::keys;
use crate::error::AppError;

/// Single-slot refresh-token bookkeeping: at most one live refresh token per
/// user. Storing overwrites the previous slot, so an older token is unusable
/// even before its natural expiry.
#[async_trait]
pub trait RefreshSessions: Send + Sync {
    async fn store(&self, user_id: Uuid, token: &str) -> Result<(), AppError>;
    async fn current(&self, user_id: Uuid) -> Result<Option<String>, AppError>;
    async fn remove(&self, user_id: Uuid) -> Result<(), AppError>;
}

/// Requires exact equality between the presented token and the stored slot.
/// Absence and mismatch are reported identically so a caller cannot tell
/// whether a token was superseded or the session ended.
pub async fn verify_presented<S: RefreshSessions + ?Sized>(
    sessions: &S,
    user_id: Uuid,
    presented: &str,
) -> Result<(), AppError> {
    match sessions.current(user_id).await? {
        Some(stored) if stored == presented => Ok(()),
        _ => Err(AppError::Unauthorized("Invalid refresh token".to_string())),
    }
}

#[derive(Clone)]
pub struct RedisSessions {
    redis: Arc<RedisClient>,
}

impl RedisSessions {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl RefreshSessions for RedisSessions {
    async fn store(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(
                keys::refresh_token_key(user_id),
                token,
                REFRESH_TOKEN_TTL_SECS as u64,
            )
            .await?;
        Ok(())
    }

    async fn current(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(keys::refresh_token_key(user_id)).await?;
        Ok(stored)
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(keys::refresh_token_key(user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemorySessions {
        slots: Mutex<HashMap<Uuid, String>>,
    }

    #[async_trait]
    impl RefreshSessions for MemorySessions {
        async fn store(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
            self.slots.lock().await.insert(user_id, token.to_string());
            Ok(())
        }

        async fn current(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
            Ok(self.slots.lock().await.get(&user_id).cloned())
        }

        async fn remove(&self, user_id: Uuid) -> Result<(), AppError> {
            self.slots.lock().await.remove(&user_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn storing_a_new_token_supersedes_the_previous_one() {
        let sessions = MemorySessions::default();
        let user = Uuid::new_v4();

        sessions.store(user, "first").await.unwrap();
        verify_presented(&sessions, user, "first").await.unwrap();

        sessions.store(user, "second").await.unwrap();
        assert!(verify_presented(&sessions, user, "first").await.is_err());
        verify_presented(&sessions, user, "second").await.unwrap();
    }

    #[tokio::test]
    async fn removed_session_rejects_previously_valid_token() {
        let sessions = MemorySessions::default();
        let user = Uuid::new_v4();

        sessions.store(user, "token").await.unwrap();
        sessions.remove(user).await.unwrap();

        assert!(verify_presented(&sessions, user, "token").await.is_err());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let sessions = MemorySessions::default();
        let user = Uuid::new_v4();

        sessions.remove(user).await.unwrap();
        sessions.remove(user).await.unwrap();
    }

    #[tokio::test]
    async fn empty_slot_rejects_any_token() {
        let sessions = MemorySessions::default();
        assert!(
            verify_presented(&sessions, Uuid::new_v4(), "anything")
                .await
                .is_err()
        );
    }
}
