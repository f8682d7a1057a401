pub mod auth;
pub mod project;
pub mod task;
pub mod user;

pub use auth::AuthService;
pub use project::ProjectService;
pub use task::TaskService;
pub use user::UserService;

use crate::repository::CachedRepository;
use crate::repository::project::ProjectStore;
use crate::repository::task::TaskStore;
use crate::repository::user::UserStore;

pub type UserRepository = CachedRepository<UserStore>;
pub type ProjectRepository = CachedRepository<ProjectStore>;
pub type TaskRepository = CachedRepository<TaskStore>;
