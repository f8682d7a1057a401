use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Priority, TaskStatus};

fn default_priority() -> Priority {
    Priority::Medium
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub assigned_to: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub actual_hours: Option<f64>,
    pub blocked_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignTaskRequest {
    pub user_id: Uuid,
    pub allocated_hours: Option<f64>,
}

fn default_internal() -> bool {
    false
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub comment: String,
    #[serde(default = "default_internal")]
    pub is_internal: bool,
}
