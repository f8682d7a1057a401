use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    database: bool,
    cache: bool,
}

/// Liveness probe; reports each backing service independently so a degraded
/// cache does not read as a dead database.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    let cache = match state.redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok(),
        Err(_) => false,
    };

    let status = if database { "ok" } else { "degraded" };
    Json(HealthStatus {
        status,
        database,
        cache,
    })
}
