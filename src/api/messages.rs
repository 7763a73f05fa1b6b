//! Message endpoints
//!
//! Sending an inquiry is public; reading is restricted to the agent who owns
//! the listing it was sent against.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::PageParams;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::Paginated;
use crate::models::{Message, NewMessage};

/// Build the public message routes
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", axum::routing::post(create_message))
}

/// Build the agent-only message routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_messages))
        .route("/{id}", get(get_message))
}

#[derive(Debug, Deserialize)]
struct CreateMessageInput {
    listing_id: i64,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    content: Option<String>,
}

/// POST /messages - Send an inquiry about a listing
async fn create_message(
    State(state): State<AppState>,
    Json(input): Json<CreateMessageInput>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state
        .message_service
        .create(NewMessage {
            listing_id: input.listing_id,
            name: input.name.unwrap_or_default(),
            email: input.email,
            phone: input.phone,
            content: input.content.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /messages - Inquiries against the caller's listings, newest first
async fn list_messages(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(pagination): Query<PageParams>,
) -> Result<Json<Paginated<Message>>, ApiError> {
    let (page, per_page) = pagination.resolve();
    let (items, total) = state
        .message_service
        .list_for_agent(&user, page, per_page)
        .await?;

    Ok(Json(Paginated {
        items,
        total,
        page,
        per_page,
    }))
}

/// GET /messages/{id} - A single inquiry, owning agent only
async fn get_message(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ApiError> {
    let message = state.message_service.get_for_agent(id, &user).await?;
    Ok(Json(message))
}
