use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{EntityStore, FindOptions};
use crate::error::AppError;
use crate::models::{Priority, Task, TaskComment, TaskHistory, TaskStatus};

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
    pub estimated_hours: Option<f64>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub actual_hours: Option<f64>,
    pub blocked_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Clone)]
pub struct TaskStore {
    pool: PgPool,
}

impl TaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
        let mut sep = " WHERE ";
        if let Some(project_id) = filter.project_id {
            qb.push(sep).push("project_id = ").push_bind(project_id);
            sep = " AND ";
        }
        if let Some(status) = filter.status {
            qb.push(sep).push("status = ").push_bind(status);
            sep = " AND ";
        }
        if let Some(user_id) = filter.assigned_to {
            qb.push(sep)
                .push("EXISTS (SELECT 1 FROM task_assignees ta WHERE ta.task_id = tasks.id AND ta.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }

    pub async fn assignee_ids(&self, task_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM task_assignees WHERE task_id = $1")
                .bind(task_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    pub async fn assign_user(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        allocated_hours: Option<f64>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO task_assignees (task_id, user_id, allocated_hours) VALUES ($1, $2, $3)",
        )
        .bind(task_id)
        .bind(user_id)
        .bind(allocated_hours)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn comments(&self, task_id: Uuid) -> Result<Vec<TaskComment>, AppError> {
        let comments = sqlx::query_as::<_, TaskComment>(
            "SELECT * FROM task_comments WHERE task_id = $1 ORDER BY created_at",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    pub async fn add_comment(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        comment: &str,
        is_internal: bool,
    ) -> Result<TaskComment, AppError> {
        let comment = sqlx::query_as::<_, TaskComment>(
            "INSERT INTO task_comments (id, task_id, user_id, comment, is_internal) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(user_id)
        .bind(comment)
        .bind(is_internal)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    /// History rows are append-only; nothing in the API updates or deletes
    /// them.
    pub async fn record_history(
        &self,
        task_id: Uuid,
        field_changed: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        changed_by: Uuid,
    ) -> Result<TaskHistory, AppError> {
        let history = sqlx::query_as::<_, TaskHistory>(
            "INSERT INTO task_history (id, task_id, field_changed, old_value, new_value, changed_by) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(field_changed)
        .bind(old_value)
        .bind(new_value)
        .bind(changed_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(history)
    }

    pub async fn find_overdue(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE end_date < now() AND status = ANY($1) \
             ORDER BY end_date",
        )
        .bind(vec![
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::InReview,
        ])
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }
}

#[async_trait]
impl EntityStore for TaskStore {
    type Entity = Task;
    type Create = CreateTask;
    type Update = UpdateTask;
    type Filter = TaskFilter;

    fn entity_type(&self) -> &'static str {
        "task"
    }

    async fn insert(&self, data: CreateTask) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks \
             (id, project_id, title, description, status, priority, start_date, end_date, \
              estimated_hours, actual_hours, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(TaskStatus::Pending)
        .bind(data.priority)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.estimated_hours)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn fetch_page(&self, options: &FindOptions<TaskFilter>) -> Result<Vec<Task>, AppError> {
        let mut qb = QueryBuilder::new("SELECT * FROM tasks");
        Self::push_filter(&mut qb, &options.filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(options.take)
            .push(" OFFSET ")
            .push_bind(options.skip);

        let tasks = qb.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    async fn count(&self, filter: &TaskFilter) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        Self::push_filter(&mut qb, filter);

        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn apply_update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, AppError> {
        let mut qb = QueryBuilder::new("UPDATE tasks SET updated_at = now()");
        if let Some(title) = data.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(status) = data.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(priority) = data.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        if let Some(actual_hours) = data.actual_hours {
            qb.push(", actual_hours = ").push_bind(actual_hours);
        }
        if let Some(blocked_reason) = data.blocked_reason {
            qb.push(", blocked_reason = ").push_bind(blocked_reason);
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let task = qb
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
