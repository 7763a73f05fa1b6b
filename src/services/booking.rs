//! Booking service
//!
//! Booking creation with overlap prevention, and the agent-facing booking
//! queries. Only pending and confirmed bookings hold their dates.

use crate::db::repositories::{BookingRepository, ListingRepository};
use crate::models::{Booking, BookingStatus, NewBooking, User};
use chrono::NaiveDate;
use std::sync::Arc;

/// Error types for booking service operations
#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    /// Target listing does not exist
    #[error("Listing not found")]
    ListingNotFound,

    /// Booking not found
    #[error("Booking not found")]
    NotFound,

    /// Caller is not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Validation error (invalid input)
    #[error("{0}")]
    ValidationError(String),

    /// Requested dates overlap an existing booking
    #[error("Requested dates are unavailable")]
    Conflict(Box<Booking>),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for a booking request, dates already parsed
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub listing_id: i64,
    pub guest_name: String,
    pub guest_email: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Booking service
pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    listing_repo: Arc<dyn ListingRepository>,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        listing_repo: Arc<dyn ListingRepository>,
    ) -> Self {
        Self {
            booking_repo,
            listing_repo,
        }
    }

    /// Create a booking request against a listing.
    ///
    /// Rejects when the inclusive date range overlaps any pending or
    /// confirmed booking for the same listing; the conflicting booking is
    /// returned in the error.
    ///
    /// The check is read-then-insert without a lock or database constraint,
    /// so two simultaneous conflicting requests can both succeed. Accepted
    /// for now at this traffic level.
    pub async fn create(&self, request: BookingRequest) -> Result<Booking, BookingServiceError> {
        if self
            .listing_repo
            .get_by_id(request.listing_id)
            .await?
            .is_none()
        {
            return Err(BookingServiceError::ListingNotFound);
        }

        if request.guest_name.trim().is_empty() {
            return Err(BookingServiceError::ValidationError(
                "guest_name is required".to_string(),
            ));
        }
        if request.end_date < request.start_date {
            return Err(BookingServiceError::ValidationError(
                "end_date must not be before start_date".to_string(),
            ));
        }

        let blocking = self
            .booking_repo
            .list_blocking_for_listing(request.listing_id)
            .await?;
        if let Some(conflict) = blocking
            .into_iter()
            .find(|b| b.overlaps(request.start_date, request.end_date))
        {
            return Err(BookingServiceError::Conflict(Box::new(conflict)));
        }

        let booking = self
            .booking_repo
            .create(&NewBooking {
                listing_id: request.listing_id,
                guest_name: request.guest_name,
                guest_email: request.guest_email,
                start_date: request.start_date,
                end_date: request.end_date,
                status: BookingStatus::Pending,
            })
            .await?;

        tracing::info!(
            booking_id = booking.id,
            listing_id = booking.listing_id,
            "Booking created"
        );
        Ok(booking)
    }

    /// Bookings against the caller's listings
    pub async fn list_for_agent(
        &self,
        caller: &User,
        status: Option<BookingStatus>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Booking>, i64), BookingServiceError> {
        Ok(self
            .booking_repo
            .list_for_agent(caller.id, status, page, per_page)
            .await?)
    }

    /// Get a booking, visible only to the agent owning its listing
    pub async fn get_for_agent(
        &self,
        id: i64,
        caller: &User,
    ) -> Result<Booking, BookingServiceError> {
        let booking = self
            .booking_repo
            .get_by_id(id)
            .await?
            .ok_or(BookingServiceError::NotFound)?;
        self.check_ownership(&booking, caller).await?;
        Ok(booking)
    }

    /// Set a booking's status. Owning agent only.
    pub async fn update_status(
        &self,
        id: i64,
        status: BookingStatus,
        caller: &User,
    ) -> Result<Booking, BookingServiceError> {
        let mut booking = self.get_for_agent(id, caller).await?;

        self.booking_repo.update_status(id, status).await?;
        booking.status = status;

        tracing::info!(booking_id = id, status = %status, "Booking status updated");
        Ok(booking)
    }

    async fn check_ownership(
        &self,
        booking: &Booking,
        caller: &User,
    ) -> Result<(), BookingServiceError> {
        let listing = self
            .listing_repo
            .get_by_id(booking.listing_id)
            .await?
            .ok_or(BookingServiceError::NotFound)?;
        if !caller.owns_listing(listing.agent_id) {
            return Err(BookingServiceError::Forbidden(
                "You do not own this booking's listing".to_string(),
            ));
        }
        Ok(())
    }
}
