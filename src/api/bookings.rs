//! Booking endpoints
//!
//! Booking requests are public; management (listing, confirming, cancelling)
//! is restricted to the agent owning the booked listing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::common::PageParams;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::Paginated;
use crate::models::{Booking, BookingStatus};
use crate::services::booking::BookingRequest;

/// Build the public booking routes
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", axum::routing::post(create_booking))
}

/// Build the agent-only booking routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings))
        .route("/{id}", get(get_booking).patch(update_booking))
}

#[derive(Debug, Deserialize)]
struct CreateBookingInput {
    listing_id: i64,
    guest_name: Option<String>,
    guest_email: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, ApiError> {
    let raw = value
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{} must be a YYYY-MM-DD date", field)))
}

/// POST /bookings - Request a date range on a listing
async fn create_booking(
    State(state): State<AppState>,
    Json(input): Json<CreateBookingInput>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let start_date = parse_date(input.start_date.as_deref(), "start_date")?;
    let end_date = parse_date(input.end_date.as_deref(), "end_date")?;

    let booking = state
        .booking_service
        .create(BookingRequest {
            listing_id: input.listing_id,
            guest_name: input.guest_name.unwrap_or_default(),
            guest_email: input.guest_email,
            start_date,
            end_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Debug, Deserialize)]
struct BookingListQuery {
    status: Option<String>,
    #[serde(flatten)]
    pagination: PageParams,
}

/// GET /bookings - Bookings against the caller's listings
async fn list_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Paginated<Booking>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(BookingStatus::from_str)
        .transpose()
        .map_err(|_| ApiError::bad_request("Invalid booking status"))?;

    let (page, per_page) = query.pagination.resolve();
    let (items, total) = state
        .booking_service
        .list_for_agent(&user, status, page, per_page)
        .await?;

    Ok(Json(Paginated {
        items,
        total,
        page,
        per_page,
    }))
}

/// GET /bookings/{id} - A single booking, owning agent only
async fn get_booking(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state.booking_service.get_for_agent(id, &user).await?;
    Ok(Json(booking))
}

#[derive(Debug, Deserialize)]
struct UpdateBookingInput {
    status: String,
}

/// PATCH /bookings/{id} - Set a booking's status, owning agent only
async fn update_booking(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateBookingInput>,
) -> Result<Json<Booking>, ApiError> {
    let status = BookingStatus::from_str(&input.status)
        .map_err(|_| ApiError::bad_request("Invalid booking status"))?;

    let booking = state
        .booking_service
        .update_status(id, status, &user)
        .await?;
    Ok(Json(booking))
}
