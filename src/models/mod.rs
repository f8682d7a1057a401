pub mod project;
pub mod task;
pub mod user;

pub use project::{Priority, Project, ProjectMember, ProjectStatus};
pub use task::{Task, TaskComment, TaskHistory, TaskStatus};
pub use user::{User, UserRole, UserStatus};
