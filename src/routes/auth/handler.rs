use axum::{
    extract::{Extension, Json, State},
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUser,
    services::auth::RegisterUser,
    utils::success_to_api_response,
};

use super::model::{
    AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest,
};

const MIN_PASSWORD_LEN: usize = 8;

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_credentials(&req.email, &req.password)?;

    let issued = state
        .auth
        .register(RegisterUser {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;

    Ok(success_to_api_response(AuthResponse {
        user: issued.user,
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
    }))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = state.auth.login(&req.email, &req.password).await?;

    Ok(success_to_api_response(AuthResponse {
        user: issued.user,
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
    }))
}

#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let access_token = state.auth.refresh(&req.refresh_token).await?;
    Ok(success_to_api_response(RefreshResponse { access_token }))
}

/// Tied to the authenticated identity rather than a user id in the body.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    state.auth.logout(user.id).await?;
    Ok(success_to_api_response(()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_validation_rejects_bad_input() {
        assert!(validate_credentials("dev@example.com", "long-enough").is_ok());
        assert!(matches!(
            validate_credentials("not-an-email", "long-enough"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_credentials("dev@example.com", "short"),
            Err(AppError::Validation(_))
        ));
    }
}
