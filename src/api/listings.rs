//! Listing endpoints
//!
//! Browsing and the two searches are public. Creation and mutation require
//! an authenticated agent; mutation additionally requires ownership.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::fs;
use uuid::Uuid;

use crate::api::common::PageParams;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{
    GeoListingResponse, GeoSearchResponse, ImageUploadResponse, Paginated,
};
use crate::db::repositories::{ListingFilter, ListingSort};
use crate::models::{Listing, ListingPatch, NewListing};
use crate::services::geo::DEFAULT_RADIUS_KM;

/// Build the public listing routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_listings))
        .route("/search", get(search_listings))
        .route("/{id}", get(get_listing))
}

/// Build the agent-only listing routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_listing))
        .route(
            "/{id}",
            axum::routing::patch(update_listing).delete(delete_listing),
        )
        .route("/{id}/images", post(upload_images))
}

#[derive(Debug, Deserialize)]
struct ListingListQuery {
    city: Option<String>,
    property_type: Option<String>,
    status: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    /// Minimum number of bedrooms
    bedrooms: Option<i64>,
    /// Minimum number of bathrooms
    bathrooms: Option<i64>,
    sort: Option<String>,
    #[serde(flatten)]
    pagination: PageParams,
}

/// GET /listings - Filtered, sorted, paginated search
async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingListQuery>,
) -> Result<Json<Paginated<Listing>>, ApiError> {
    let sort = match query.sort.as_deref() {
        Some(raw) => ListingSort::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid sort field: {}", raw)))?,
        None => ListingSort::default(),
    };
    let (page, per_page) = query.pagination.resolve();

    let filter = ListingFilter {
        city: query.city,
        property_type: query.property_type,
        status: query.status,
        min_price: query.min_price,
        max_price: query.max_price,
        bedrooms: query.bedrooms,
        bathrooms: query.bathrooms,
        sort,
        page,
        per_page,
    };

    let (items, total) = state.listing_service.list(&filter).await?;
    Ok(Json(Paginated {
        items,
        total,
        page,
        per_page,
    }))
}

/// GET /listings/{id} - A single listing
async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state.listing_service.get(id).await?;
    Ok(Json(listing))
}

/// POST /listings - Create a listing owned by the caller
async fn create_listing(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(input): Json<NewListing>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    let listing = state.listing_service.create(input, &user).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// PATCH /listings/{id} - Partial update, owning agent only
async fn update_listing(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(patch): Json<ListingPatch>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state.listing_service.update(id, patch, &user).await?;
    Ok(Json(listing))
}

/// DELETE /listings/{id} - Delete a listing, owning agent only
async fn delete_listing(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.listing_service.delete(id, &user).await?;
    Ok(Json(serde_json::json!({ "message": "deleted" })))
}

// ============================================================================
// Geo search
// ============================================================================

/// Raw geo search parameters, parsed by hand for controlled error messages
#[derive(Debug, Deserialize)]
struct GeoSearchQuery {
    lat: Option<String>,
    lng: Option<String>,
    radius_km: Option<String>,
}

fn parse_float(value: Option<&str>, field: &str) -> Result<f64, ApiError> {
    let raw = value.ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))?;
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("{} must be a number", field)))
}

/// GET /listings/search - Listings within a radius of a point
async fn search_listings(
    State(state): State<AppState>,
    Query(query): Query<GeoSearchQuery>,
) -> Result<Json<GeoSearchResponse>, ApiError> {
    let lat = parse_float(query.lat.as_deref(), "lat")?;
    let lng = parse_float(query.lng.as_deref(), "lng")?;
    let radius_km = match query.radius_km.as_deref() {
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::bad_request("radius_km must be a number"))?,
        None => DEFAULT_RADIUS_KM,
    };

    let matches = state.listing_service.geo_search(lat, lng, radius_km).await?;
    let items: Vec<GeoListingResponse> = matches
        .into_iter()
        .map(|m| GeoListingResponse {
            listing: m.listing,
            distance_km: m.distance_km,
        })
        .collect();

    Ok(Json(GeoSearchResponse {
        count: items.len(),
        items,
        lat,
        lng,
        radius_km,
    }))
}

// ============================================================================
// Image upload
// ============================================================================

/// POST /listings/{id}/images - Attach uploaded images, owning agent only
///
/// Accepts multipart/form-data with one or more file fields named "images".
/// Each accepted file is saved under a fresh UUID name and its URL appended
/// to the listing.
async fn upload_images(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageUploadResponse>), ApiError> {
    let config = &state.upload_config;

    // Ownership check before any file hits the disk
    let listing = state.listing_service.get(id).await?;
    if !user.owns_listing(listing.agent_id) {
        return Err(ApiError::forbidden("You do not own this listing"));
    }

    if !config.path.exists() {
        fs::create_dir_all(&config.path)
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to create upload dir: {}", e)))?;
    }

    let mut saved_urls = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "images" {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !config.is_type_allowed(&content_type) {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
        if data.len() as u64 > config.max_file_size {
            continue;
        }

        let ext = config.get_extension(&content_type);
        let new_filename = format!("{}.{}", Uuid::new_v4(), ext);
        let file_path = config.path.join(&new_filename);

        fs::write(&file_path, &data)
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

        saved_urls.push(format!("/uploads/{}", new_filename));
    }

    if saved_urls.is_empty() {
        return Err(ApiError::bad_request("No valid image files provided"));
    }

    state
        .listing_service
        .append_images(id, saved_urls.clone(), &user)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ImageUploadResponse {
            image_urls: saved_urls,
        }),
    ))
}
