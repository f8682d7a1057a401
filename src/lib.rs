use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod utils;

use auth::{RedisSessions, TokenService};
use cache::{CacheBackend, RedisBackend};
use config::Config;
use repository::CachedRepository;
use repository::project::ProjectStore;
use repository::task::TaskStore;
use repository::user::UserStore;
use services::{AuthService, ProjectService, TaskService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub tokens: TokenService,
    pub auth: AuthService,
    pub users: UserService,
    pub projects: ProjectService,
    pub tasks: TaskService,
}

impl AppState {
    /// Wires every service against shared Postgres and Redis handles.
    pub fn new(config: Config, pool: PgPool, redis: Arc<RedisClient>) -> Self {
        let cache: Arc<dyn CacheBackend> = Arc::new(RedisBackend::new(redis.clone()));
        let tokens = TokenService::new(&config.jwt_secret, &config.refresh_token_secret);
        let sessions = Arc::new(RedisSessions::new(redis.clone()));

        let user_repo = Arc::new(CachedRepository::new(
            UserStore::new(pool.clone()),
            cache.clone(),
        ));
        let project_repo = Arc::new(CachedRepository::new(
            ProjectStore::new(pool.clone()),
            cache.clone(),
        ));
        let task_repo = Arc::new(CachedRepository::new(
            TaskStore::new(pool.clone()),
            cache.clone(),
        ));

        Self {
            pool,
            config,
            redis,
            tokens: tokens.clone(),
            auth: AuthService::new(user_repo.clone(), tokens, sessions),
            users: UserService::new(user_repo),
            projects: ProjectService::new(project_repo),
            tasks: TaskService::new(task_repo),
        }
    }
}
