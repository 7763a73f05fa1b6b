//! Authentication endpoints

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::AuthResponse;
use crate::services::RegisterInput;

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
struct LoginInput {
    email: String,
    password: String,
}

/// POST /auth/register - Create an account and return a token
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state.user_service.register(input).await?;
    let access_token = state
        .token_service
        .issue(user.id)
        .map_err(ApiError::internal_error)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { access_token, user })))
}

/// POST /auth/login - Exchange credentials for a token
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .user_service
        .login(&input.email, &input.password)
        .await?;
    let access_token = state
        .token_service
        .issue(user.id)
        .map_err(ApiError::internal_error)?;

    Ok(Json(AuthResponse { access_token, user }))
}
