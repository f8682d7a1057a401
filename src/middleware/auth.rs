use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::models::UserRole;

pub const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

/// Request-scoped identity populated from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

/// Only the literal `Bearer ` scheme is accepted.
fn extract_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer)
        .ok_or_else(|| AppError::Unauthorized("Missing or malformed token".to_string()))?;

    let claims = state.tokens.verify_access_token(token)?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Second-stage gate layered after [`auth_middleware`]; enforces exact
/// membership in a per-route allow-list.
pub async fn require_role(
    State(allowed): State<&'static [UserRole]>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    if !allowed.contains(&user.role) {
        tracing::warn!(
            "unauthorized role access attempt: user {} has {}, required {:?}",
            user.id,
            user.role.as_str(),
            allowed
        );
        return Err(AppError::Forbidden(
            "Access denied: insufficient privileges".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction_requires_exact_scheme() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("bearer abc"), None);
        assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer("Bearer"), None);
    }

    #[test]
    fn role_allow_list_is_exact_membership() {
        assert!(ADMIN_ONLY.contains(&UserRole::Admin));
        assert!(!ADMIN_ONLY.contains(&UserRole::Manager));
        assert!(!ADMIN_ONLY.contains(&UserRole::Developer));
    }
}
