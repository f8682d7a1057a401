use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::ProjectRepository;
use crate::error::AppError;
use crate::models::{Priority, Project, ProjectMember, ProjectStatus, Task};
use crate::repository::{FindOptions, PaginatedResult};
use crate::repository::project::{CreateProject, ProjectFilter, UpdateProject};

pub const DEFAULT_MEMBER_ROLE: &str = "MEMBER";
pub const DEFAULT_MEMBER_HOURS: f64 = 40.0;

#[derive(Debug)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetails {
    pub project: Project,
    pub members: Vec<ProjectMember>,
    pub tasks: Vec<Task>,
}

/// Ownership rule shared by every project mutation: only the owner may
/// change a project or its membership.
fn ensure_owner(project: &Project, requester: Uuid) -> Result<(), AppError> {
    if project.owner_id != requester {
        return Err(AppError::Forbidden(
            "No permission to modify this project".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProjectService {
    repo: Arc<ProjectRepository>,
}

impl ProjectService {
    pub fn new(repo: Arc<ProjectRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_project(
        &self,
        owner_id: Uuid,
        data: NewProject,
    ) -> Result<Project, AppError> {
        if data.end_date <= data.start_date {
            return Err(AppError::Validation(
                "End date must be after start date".to_string(),
            ));
        }

        self.repo
            .create(CreateProject {
                name: data.name,
                description: data.description,
                priority: data.priority,
                start_date: data.start_date,
                end_date: data.end_date,
                budget: data.budget,
                owner_id,
                created_by: owner_id,
            })
            .await
    }

    pub async fn get_project(&self, project_id: Uuid) -> Result<Project, AppError> {
        self.repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }

    pub async fn get_project_details(&self, project_id: Uuid) -> Result<ProjectDetails, AppError> {
        let project = self.get_project(project_id).await?;
        let (members, tasks) = tokio::try_join!(
            self.repo.store().members(project_id),
            self.repo.store().tasks(project_id)
        )?;

        Ok(ProjectDetails {
            project,
            members,
            tasks,
        })
    }

    /// Archived projects are excluded from the general listing.
    pub async fn list_projects(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<PaginatedResult<Project>, AppError> {
        self.repo
            .find_all(FindOptions::page(
                page,
                page_size,
                ProjectFilter {
                    status_not: Some(ProjectStatus::Archived),
                    owner_id: None,
                },
            ))
            .await
    }

    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<PaginatedResult<Project>, AppError> {
        self.repo
            .find_all(FindOptions::page(
                page,
                page_size,
                ProjectFilter {
                    status_not: None,
                    owner_id: Some(owner_id),
                },
            ))
            .await
    }

    pub async fn update_project(
        &self,
        project_id: Uuid,
        requester: Uuid,
        data: UpdateProject,
    ) -> Result<Project, AppError> {
        let project = self.get_project(project_id).await?;
        ensure_owner(&project, requester)?;

        let updated = self.repo.update(project_id, data).await?;
        tracing::info!("project {} updated by {}", project_id, requester);
        Ok(updated)
    }

    pub async fn delete_project(&self, project_id: Uuid, requester: Uuid) -> Result<(), AppError> {
        let project = self.get_project(project_id).await?;
        ensure_owner(&project, requester)?;

        self.repo.delete(project_id).await?;
        tracing::info!("project {} deleted by {}", project_id, requester);
        Ok(())
    }

    pub async fn add_member(
        &self,
        project_id: Uuid,
        requester: Uuid,
        member_id: Uuid,
        role: Option<String>,
        hours_allocated: Option<f64>,
    ) -> Result<ProjectMember, AppError> {
        let project = self.get_project(project_id).await?;
        ensure_owner(&project, requester)?;

        let member = self
            .repo
            .store()
            .add_member(
                project_id,
                member_id,
                role.as_deref().unwrap_or(DEFAULT_MEMBER_ROLE),
                hours_allocated.unwrap_or(DEFAULT_MEMBER_HOURS),
            )
            .await?;
        tracing::info!("member {} added to project {}", member_id, project_id);
        Ok(member)
    }

    pub async fn remove_member(
        &self,
        project_id: Uuid,
        requester: Uuid,
        member_id: Uuid,
    ) -> Result<(), AppError> {
        let project = self.get_project(project_id).await?;
        ensure_owner(&project, requester)?;

        self.repo.store().remove_member(project_id, member_id).await?;
        tracing::info!("member {} removed from project {}", member_id, project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_owned_by(owner_id: Uuid) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: "Rollout".to_string(),
            description: None,
            status: ProjectStatus::Planning,
            priority: Priority::Medium,
            start_date: now,
            end_date: now + chrono::Duration::days(30),
            budget: None,
            owner_id,
            created_by: owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_passes_ownership_check() {
        let owner = Uuid::new_v4();
        let project = project_owned_by(owner);
        assert!(ensure_owner(&project, owner).is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let project = project_owned_by(Uuid::new_v4());
        let err = ensure_owner(&project, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
