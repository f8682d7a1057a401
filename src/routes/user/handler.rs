use axum::{
    extract::{Extension, Json, Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUser,
    models::UserRole,
    routes::Pagination,
    services::user::ProfileChanges,
    utils::success_to_api_response,
};

use super::model::{UpdateProfileRequest, UpdateRoleRequest, UpdateStatusRequest};

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.users.get_user(user.id).await?;
    Ok(success_to_api_response(profile))
}

#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .users
        .update_profile(
            user.id,
            ProfileChanges {
                first_name: req.first_name,
                last_name: req.last_name,
                phone: req.phone,
                avatar_url: req.avatar_url,
                password: req.password,
            },
        )
        .await?;
    Ok(success_to_api_response(updated))
}

#[axum::debug_handler]
pub async fn deactivate_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    state.users.deactivate(user.id).await?;
    state.auth.logout(user.id).await?;
    Ok(success_to_api_response(()))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.get_user(user_id).await?;
    Ok(success_to_api_response(user))
}

#[axum::debug_handler]
pub async fn list_by_role(
    State(state): State<AppState>,
    Path(role): Path<UserRole>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.users.list_by_role(role).await?;
    Ok(success_to_api_response(users))
}

// Admin-only from here down; the role gate is applied at the router level.

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.users.list_users(page.page, page.page_size).await?;
    Ok(success_to_api_response(users))
}

#[axum::debug_handler]
pub async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.users.update_role(user_id, req.role).await?;
    Ok(success_to_api_response(updated))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.users.update_status(user_id, req.status).await?;
    Ok(success_to_api_response(updated))
}
