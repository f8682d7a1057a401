use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{EntityStore, FindOptions};
use crate::error::AppError;
use crate::models::{Priority, Project, ProjectMember, ProjectStatus, Task};

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: Option<f64>,
    pub owner_id: Uuid,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectFilter {
    pub status_not: Option<ProjectStatus>,
    pub owner_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ProjectStore {
    pool: PgPool,
}

impl ProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProjectFilter) {
        let mut sep = " WHERE ";
        if let Some(status) = filter.status_not {
            qb.push(sep).push("status <> ").push_bind(status);
            sep = " AND ";
        }
        if let Some(owner_id) = filter.owner_id {
            qb.push(sep).push("owner_id = ").push_bind(owner_id);
        }
    }

    pub async fn members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError> {
        let members = sqlx::query_as::<_, ProjectMember>(
            "SELECT * FROM project_members WHERE project_id = $1 ORDER BY created_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    pub async fn add_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: &str,
        hours_allocated: f64,
    ) -> Result<ProjectMember, AppError> {
        let member = sqlx::query_as::<_, ProjectMember>(
            "INSERT INTO project_members (project_id, user_id, role, hours_allocated) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .bind(hours_allocated)
        .fetch_one(&self.pool)
        .await?;
        Ok(member)
    }

    pub async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn tasks(&self, project_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }
}

#[async_trait]
impl EntityStore for ProjectStore {
    type Entity = Project;
    type Create = CreateProject;
    type Update = UpdateProject;
    type Filter = ProjectFilter;

    fn entity_type(&self) -> &'static str {
        "project"
    }

    async fn insert(&self, data: CreateProject) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects \
             (id, name, description, status, priority, start_date, end_date, budget, owner_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.description)
        .bind(ProjectStatus::Planning)
        .bind(data.priority)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.budget)
        .bind(data.owner_id)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn fetch_page(
        &self,
        options: &FindOptions<ProjectFilter>,
    ) -> Result<Vec<Project>, AppError> {
        let mut qb = QueryBuilder::new("SELECT * FROM projects");
        Self::push_filter(&mut qb, &options.filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(options.take)
            .push(" OFFSET ")
            .push_bind(options.skip);

        let projects = qb.build_query_as::<Project>().fetch_all(&self.pool).await?;
        Ok(projects)
    }

    async fn count(&self, filter: &ProjectFilter) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM projects");
        Self::push_filter(&mut qb, filter);

        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn apply_update(
        &self,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Project>, AppError> {
        let mut qb = QueryBuilder::new("UPDATE projects SET updated_at = now()");
        if let Some(name) = data.name {
            qb.push(", name = ").push_bind(name);
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
        if let Some(start_date) = data.start_date {
            qb.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            qb.push(", end_date = ").push_bind(end_date);
        }
        if let Some(budget) = data.budget {
            qb.push(", budget = ").push_bind(budget);
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let project = qb
            .build_query_as::<Project>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
