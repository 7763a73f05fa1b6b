//! Listing service
//!
//! Listing CRUD with ownership enforcement, the filtered search, and the
//! geo radius search.

use crate::db::repositories::{ListingFilter, ListingRepository};
use crate::models::{Listing, ListingPatch, NewListing, User};
use crate::services::geo::{haversine_km, round_km};
use std::sync::Arc;

/// Error types for listing service operations
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    /// Listing not found
    #[error("Listing not found")]
    NotFound,

    /// Caller is not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Validation error (invalid input)
    #[error("{0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A geo search match with its distance from the query point
#[derive(Debug, Clone)]
pub struct GeoMatch {
    pub listing: Listing,
    /// Distance from the query point, km, rounded to 3 decimals
    pub distance_km: f64,
}

/// Listing service
pub struct ListingService {
    listing_repo: Arc<dyn ListingRepository>,
}

impl ListingService {
    /// Create a new listing service
    pub fn new(listing_repo: Arc<dyn ListingRepository>) -> Self {
        Self { listing_repo }
    }

    /// Create a listing owned by the caller. Agents only.
    pub async fn create(
        &self,
        input: NewListing,
        caller: &User,
    ) -> Result<Listing, ListingServiceError> {
        if !caller.is_agent {
            return Err(ListingServiceError::Forbidden(
                "Only agents can create listings".to_string(),
            ));
        }

        let listing = self.listing_repo.create(&input, caller.id).await?;
        tracing::info!(listing_id = listing.id, agent_id = caller.id, "Listing created");
        Ok(listing)
    }

    /// Get a listing by id
    pub async fn get(&self, id: i64) -> Result<Listing, ListingServiceError> {
        self.listing_repo
            .get_by_id(id)
            .await?
            .ok_or(ListingServiceError::NotFound)
    }

    /// Filtered, sorted, paginated search
    pub async fn list(
        &self,
        filter: &ListingFilter,
    ) -> Result<(Vec<Listing>, i64), ListingServiceError> {
        Ok(self.listing_repo.list(filter).await?)
    }

    /// Apply a partial update. Owning agent only.
    pub async fn update(
        &self,
        id: i64,
        patch: ListingPatch,
        caller: &User,
    ) -> Result<Listing, ListingServiceError> {
        let mut listing = self.get(id).await?;
        self.check_ownership(&listing, caller)?;

        patch.apply(&mut listing);
        self.listing_repo.update(&listing).await?;
        Ok(listing)
    }

    /// Delete a listing. Owning agent only.
    pub async fn delete(&self, id: i64, caller: &User) -> Result<(), ListingServiceError> {
        let listing = self.get(id).await?;
        self.check_ownership(&listing, caller)?;

        self.listing_repo.delete(id).await?;
        tracing::info!(listing_id = id, agent_id = caller.id, "Listing deleted");
        Ok(())
    }

    /// Append freshly uploaded image URLs to a listing. Owning agent only.
    pub async fn append_images(
        &self,
        id: i64,
        urls: Vec<String>,
        caller: &User,
    ) -> Result<Listing, ListingServiceError> {
        let mut listing = self.get(id).await?;
        self.check_ownership(&listing, caller)?;

        listing.image_urls.extend(urls);
        self.listing_repo.update(&listing).await?;
        Ok(listing)
    }

    /// Radius search over all geocoded listings.
    ///
    /// Full scan; fine at directory scale, revisit with a spatial index if
    /// the listing table grows past that.
    pub async fn geo_search(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
    ) -> Result<Vec<GeoMatch>, ListingServiceError> {
        let listings = self.listing_repo.list_geocoded().await?;

        let mut matches: Vec<GeoMatch> = listings
            .into_iter()
            .filter_map(|listing| {
                let (l_lat, l_lng) = listing.coordinates()?;
                let distance = haversine_km(lat, lng, l_lat, l_lng);
                if distance <= radius_km {
                    Some(GeoMatch {
                        listing,
                        distance_km: round_km(distance),
                    })
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(matches)
    }

    fn check_ownership(
        &self,
        listing: &Listing,
        caller: &User,
    ) -> Result<(), ListingServiceError> {
        if !caller.owns_listing(listing.agent_id) {
            return Err(ListingServiceError::Forbidden(
                "You do not own this listing".to_string(),
            ));
        }
        Ok(())
    }
}
