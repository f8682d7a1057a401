use axum::{
    extract::{Extension, Json, Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUser,
    repository::task::UpdateTask,
    routes::Pagination,
    services::task::NewTask,
    utils::success_to_api_response,
};

use super::model::{AddCommentRequest, AssignTaskRequest, CreateTaskRequest, UpdateTaskRequest};

#[axum::debug_handler]
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("Task title is required".to_string()));
    }

    let task = state
        .tasks
        .create_task(
            user.id,
            NewTask {
                project_id: req.project_id,
                title: req.title,
                description: req.description,
                priority: req.priority,
                start_date: req.start_date,
                end_date: req.end_date,
                estimated_hours: req.estimated_hours,
                assigned_to: req.assigned_to,
            },
        )
        .await?;
    Ok(success_to_api_response(task))
}

#[axum::debug_handler]
pub async fn assigned_to_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = state
        .tasks
        .list_assigned_to(user.id, page.page, page.page_size)
        .await?;
    Ok(success_to_api_response(tasks))
}

#[axum::debug_handler]
pub async fn overdue_tasks(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = state.tasks.list_overdue().await?;
    Ok(success_to_api_response(tasks))
}

#[axum::debug_handler]
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.tasks.get_task(task_id).await?;
    Ok(success_to_api_response(details))
}

#[axum::debug_handler]
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = state
        .tasks
        .list_by_project(project_id, page.page, page.page_size)
        .await?;
    Ok(success_to_api_response(tasks))
}

#[axum::debug_handler]
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .tasks
        .update_task(
            task_id,
            user.id,
            UpdateTask {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                actual_hours: req.actual_hours,
                blocked_reason: req.blocked_reason,
            },
        )
        .await?;
    Ok(success_to_api_response(updated))
}

#[axum::debug_handler]
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.tasks.delete_task(task_id, user.id).await?;
    Ok(success_to_api_response(()))
}

#[axum::debug_handler]
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AssignTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .tasks
        .assign_user(task_id, user.id, req.user_id, req.allocated_hours)
        .await?;
    Ok(success_to_api_response(()))
}

#[axum::debug_handler]
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.comment.trim().is_empty() {
        return Err(AppError::Validation("Comment cannot be empty".to_string()));
    }

    let comment = state
        .tasks
        .add_comment(task_id, user.id, &req.comment, req.is_internal)
        .await?;
    Ok(success_to_api_response(comment))
}
