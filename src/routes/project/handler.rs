use axum::{
    extract::{Extension, Json, Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUser,
    repository::project::UpdateProject,
    routes::Pagination,
    services::project::NewProject,
    utils::success_to_api_response,
};

use super::model::{AddMemberRequest, CreateProjectRequest, UpdateProjectRequest};

#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let projects = state
        .projects
        .list_projects(page.page, page.page_size)
        .await?;
    Ok(success_to_api_response(projects))
}

#[axum::debug_handler]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Project name is required".to_string()));
    }

    let project = state
        .projects
        .create_project(
            user.id,
            NewProject {
                name: req.name,
                description: req.description,
                priority: req.priority,
                start_date: req.start_date,
                end_date: req.end_date,
                budget: req.budget,
            },
        )
        .await?;
    Ok(success_to_api_response(project))
}

#[axum::debug_handler]
pub async fn my_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let projects = state
        .projects
        .list_by_owner(user.id, page.page, page.page_size)
        .await?;
    Ok(success_to_api_response(projects))
}

#[axum::debug_handler]
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.projects.get_project_details(project_id).await?;
    Ok(success_to_api_response(details))
}

#[axum::debug_handler]
pub async fn update_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .projects
        .update_project(
            project_id,
            user.id,
            UpdateProject {
                name: req.name,
                description: req.description,
                status: req.status,
                priority: req.priority,
                start_date: req.start_date,
                end_date: req.end_date,
                budget: req.budget,
            },
        )
        .await?;
    Ok(success_to_api_response(updated))
}

#[axum::debug_handler]
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.projects.delete_project(project_id, user.id).await?;
    Ok(success_to_api_response(()))
}

#[axum::debug_handler]
pub async fn add_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let member = state
        .projects
        .add_member(project_id, user.id, req.user_id, req.role, req.hours_allocated)
        .await?;
    Ok(success_to_api_response(member))
}

#[axum::debug_handler]
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .projects
        .remove_member(project_id, user.id, member_id)
        .await?;
    Ok(success_to_api_response(()))
}
