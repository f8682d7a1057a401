pub mod session;
pub mod tokens;

pub use session::{RedisSessions, RefreshSessions};
pub use tokens::{AccessClaims, TokenError, TokenService};
