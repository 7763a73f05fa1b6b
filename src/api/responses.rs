//! Response body types shared across handlers.

use crate::models::{Listing, User};
use serde::Serialize;

/// A page of items with its pagination envelope
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Successful register/login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

/// A geo search match carrying its distance from the query point
#[derive(Debug, Serialize)]
pub struct GeoListingResponse {
    #[serde(flatten)]
    pub listing: Listing,
    pub distance_km: f64,
}

/// Geo search response
#[derive(Debug, Serialize)]
pub struct GeoSearchResponse {
    pub items: Vec<GeoListingResponse>,
    pub count: usize,
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

/// An agent directory entry
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    #[serde(flatten)]
    pub agent: User,
    pub listing_count: i64,
}

/// Agent detail with their listings
#[derive(Debug, Serialize)]
pub struct AgentDetailResponse {
    pub agent: User,
    pub listings: Vec<Listing>,
}

/// Newly saved image URLs for a listing
#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub image_urls: Vec<String>,
}
