use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::TaskRepository;
use crate::error::AppError;
use crate::models::{Priority, Task, TaskComment, TaskStatus};
use crate::repository::{FindOptions, PaginatedResult};
use crate::repository::task::{CreateTask, TaskFilter, UpdateTask};

#[derive(Debug)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
    pub estimated_hours: Option<f64>,
    pub assigned_to: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TaskDetails {
    pub task: Task,
    pub assignee_ids: Vec<Uuid>,
    pub comments: Vec<TaskComment>,
}

/// The creator and the assigned users may modify a task; deleting and
/// assigning stay creator-only.
fn can_modify(task: &Task, assignees: &[Uuid], requester: Uuid) -> bool {
    task.created_by == requester || assignees.contains(&requester)
}

/// Yields the (old, new) pair when an update actually changes the status.
fn status_change(current: TaskStatus, requested: Option<TaskStatus>) -> Option<(TaskStatus, TaskStatus)> {
    match requested {
        Some(next) if next != current => Some((current, next)),
        _ => None,
    }
}

#[derive(Clone)]
pub struct TaskService {
    repo: Arc<TaskRepository>,
}

impl TaskService {
    pub fn new(repo: Arc<TaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_task(&self, creator: Uuid, data: NewTask) -> Result<Task, AppError> {
        if data.end_date <= Utc::now() {
            return Err(AppError::Validation(
                "End date must be in the future".to_string(),
            ));
        }

        let assigned_to = data.assigned_to;
        let task = self
            .repo
            .create(CreateTask {
                project_id: data.project_id,
                title: data.title,
                description: data.description,
                priority: data.priority,
                start_date: data.start_date,
                end_date: data.end_date,
                estimated_hours: data.estimated_hours,
                created_by: creator,
            })
            .await?;

        for user_id in assigned_to {
            self.repo.store().assign_user(task.id, user_id, None).await?;
        }

        Ok(task)
    }

    pub async fn get_task(&self, task_id: Uuid) -> Result<TaskDetails, AppError> {
        let task = self.find_existing(task_id).await?;
        let (assignee_ids, comments) = tokio::try_join!(
            self.repo.store().assignee_ids(task_id),
            self.repo.store().comments(task_id)
        )?;

        Ok(TaskDetails {
            task,
            assignee_ids,
            comments,
        })
    }

    pub async fn list_by_project(
        &self,
        project_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<PaginatedResult<Task>, AppError> {
        self.repo
            .find_all(FindOptions::page(
                page,
                page_size,
                TaskFilter {
                    project_id: Some(project_id),
                    ..TaskFilter::default()
                },
            ))
            .await
    }

    pub async fn list_assigned_to(
        &self,
        user_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<PaginatedResult<Task>, AppError> {
        self.repo
            .find_all(FindOptions::page(
                page,
                page_size,
                TaskFilter {
                    assigned_to: Some(user_id),
                    ..TaskFilter::default()
                },
            ))
            .await
    }

    pub async fn list_overdue(&self) -> Result<Vec<Task>, AppError> {
        self.repo.store().find_overdue().await
    }

    pub async fn update_task(
        &self,
        task_id: Uuid,
        requester: Uuid,
        data: UpdateTask,
    ) -> Result<Task, AppError> {
        let task = self.find_existing(task_id).await?;

        let assignees = self.repo.store().assignee_ids(task_id).await?;
        if !can_modify(&task, &assignees, requester) {
            return Err(AppError::Forbidden(
                "No permission to update this task".to_string(),
            ));
        }

        // The audit row is written before the change is applied.
        if let Some((old, new)) = status_change(task.status, data.status) {
            self.repo
                .store()
                .record_history(
                    task_id,
                    "status",
                    Some(old.as_str()),
                    Some(new.as_str()),
                    requester,
                )
                .await?;
        }

        let updated = self.repo.update(task_id, data).await?;
        tracing::info!("task {} updated by {}", task_id, requester);
        Ok(updated)
    }

    pub async fn delete_task(&self, task_id: Uuid, requester: Uuid) -> Result<(), AppError> {
        let task = self.find_existing(task_id).await?;
        if task.created_by != requester {
            return Err(AppError::Forbidden(
                "No permission to delete this task".to_string(),
            ));
        }

        self.repo.delete(task_id).await?;
        tracing::info!("task {} deleted by {}", task_id, requester);
        Ok(())
    }

    pub async fn assign_user(
        &self,
        task_id: Uuid,
        requester: Uuid,
        assignee: Uuid,
        allocated_hours: Option<f64>,
    ) -> Result<(), AppError> {
        let task = self.find_existing(task_id).await?;
        if task.created_by != requester {
            return Err(AppError::Forbidden(
                "No permission to assign users".to_string(),
            ));
        }

        self.repo
            .store()
            .assign_user(task_id, assignee, allocated_hours)
            .await?;
        tracing::info!("user {} assigned to task {}", assignee, task_id);
        Ok(())
    }

    pub async fn add_comment(
        &self,
        task_id: Uuid,
        author: Uuid,
        comment: &str,
        is_internal: bool,
    ) -> Result<TaskComment, AppError> {
        self.find_existing(task_id).await?;
        self.repo
            .store()
            .add_comment(task_id, author, comment, is_internal)
            .await
    }

    async fn find_existing(&self, task_id: Uuid) -> Result<Task, AppError> {
        self.repo
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_created_by(creator: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Ship login flow".to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: Priority::High,
            start_date: None,
            end_date: now + chrono::Duration::days(7),
            estimated_hours: None,
            actual_hours: 0.0,
            created_by: creator,
            blocked_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn creator_and_assignees_can_modify() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let task = task_created_by(creator);

        assert!(can_modify(&task, &[assignee], creator));
        assert!(can_modify(&task, &[assignee], assignee));
        assert!(!can_modify(&task, &[assignee], stranger));
    }

    #[test]
    fn status_change_detected_only_when_different() {
        assert_eq!(
            status_change(TaskStatus::Pending, Some(TaskStatus::InProgress)),
            Some((TaskStatus::Pending, TaskStatus::InProgress))
        );
        assert_eq!(status_change(TaskStatus::Pending, Some(TaskStatus::Pending)), None);
        assert_eq!(status_change(TaskStatus::Pending, None), None);
    }

    #[test]
    fn history_values_use_wire_names() {
        let (old, new) = status_change(TaskStatus::Pending, Some(TaskStatus::InProgress)).unwrap();
        assert_eq!(old.as_str(), "PENDING");
        assert_eq!(new.as_str(), "IN_PROGRESS");
    }
}
