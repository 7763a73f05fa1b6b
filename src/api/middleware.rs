//! API middleware
//!
//! Bearer-token authentication and the shared error shape every handler
//! returns. Protected route groups attach `require_auth`, which resolves the
//! token to a full user row and stores it as a request extension.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::models::{Booking, User};
use crate::services::{
    BookingService, BookingServiceError, ListingService, ListingServiceError, MessageService,
    MessageServiceError, TokenService, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub listing_service: Arc<ListingService>,
    pub booking_service: Arc<BookingService>,
    pub message_service: Arc<MessageService>,
    pub token_service: TokenService,
    pub upload_config: Arc<crate::config::UploadConfig>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors.
///
/// Serializes as `{error, message, status}`; validation failures may carry a
/// `messages` list and booking conflicts a `conflict` payload.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    messages: Option<Vec<String>>,
    conflict: Option<Booking>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            messages: None,
            conflict: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Field-level validation failure
    pub fn validation_messages(messages: Vec<String>) -> Self {
        Self {
            messages: Some(messages),
            ..Self::new(StatusCode::BAD_REQUEST, "Validation failed")
        }
    }

    /// Booking conflict: 400 carrying the conflicting booking
    pub fn booking_conflict(conflict: Booking) -> Self {
        Self {
            conflict: Some(conflict),
            ..Self::new(StatusCode::BAD_REQUEST, "Requested dates are unavailable")
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Unclassified failure. The detail is logged, not returned.
    pub fn internal_error(err: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self
                .status
                .canonical_reason()
                .unwrap_or("Error"),
            "message": self.message,
            "status": self.status.as_u16(),
        });
        if let Some(messages) = self.messages {
            body["messages"] = json!(messages);
        }
        if let Some(conflict) = self.conflict {
            body["conflict"] = json!(conflict);
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::MissingFields(fields) => ApiError::validation_messages(
                fields
                    .into_iter()
                    .map(|f| format!("{} is required", f))
                    .collect(),
            ),
            UserServiceError::EmailTaken => ApiError::bad_request("Email already registered"),
            UserServiceError::AuthenticationError => ApiError::unauthorized("Invalid credentials"),
            UserServiceError::AgentNotFound => ApiError::not_found("Agent not found"),
            UserServiceError::InternalError(e) => ApiError::internal_error(e),
        }
    }
}

impl From<ListingServiceError> for ApiError {
    fn from(err: ListingServiceError) -> Self {
        match err {
            ListingServiceError::NotFound => ApiError::not_found("Listing not found"),
            ListingServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ListingServiceError::ValidationError(msg) => ApiError::bad_request(msg),
            ListingServiceError::InternalError(e) => ApiError::internal_error(e),
        }
    }
}

impl From<BookingServiceError> for ApiError {
    fn from(err: BookingServiceError) -> Self {
        match err {
            BookingServiceError::ListingNotFound => ApiError::not_found("Listing not found"),
            BookingServiceError::NotFound => ApiError::not_found("Booking not found"),
            BookingServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            BookingServiceError::ValidationError(msg) => ApiError::bad_request(msg),
            BookingServiceError::Conflict(booking) => ApiError::booking_conflict(*booking),
            BookingServiceError::InternalError(e) => ApiError::internal_error(e),
        }
    }
}

impl From<MessageServiceError> for ApiError {
    fn from(err: MessageServiceError) -> Self {
        match err {
            MessageServiceError::ListingNotFound => ApiError::not_found("Listing not found"),
            MessageServiceError::NotFound => ApiError::not_found("Message not found"),
            MessageServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            MessageServiceError::ValidationError(msg) => ApiError::bad_request(msg),
            MessageServiceError::InternalError(e) => ApiError::internal_error(e),
        }
    }
}

/// Extract a bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user_id = state
        .token_service
        .verify(&token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let user = state
        .user_service
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Agent authorization middleware, for routes behind `require_auth`
pub async fn require_agent(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_agent {
        return Err(ApiError::forbidden("Agent account required"));
    }

    Ok(next.run(request).await)
}
