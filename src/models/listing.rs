//! Listing model
//!
//! A property listing owned by exactly one agent. Coordinates are optional;
//! listings without them never appear in geo search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing entity representing a property on the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Unique identifier
    pub id: i64,
    /// Listing title
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Asking price
    pub price: f64,
    /// Number of bedrooms
    pub bedrooms: i64,
    /// Number of bathrooms
    pub bathrooms: i64,
    /// Property type (e.g. "apartment", "house")
    pub property_type: String,
    /// Listing status (e.g. "active", "sold")
    pub status: String,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// Latitude
    pub lat: Option<f64>,
    /// Longitude
    pub lng: Option<f64>,
    /// Uploaded image URLs
    pub image_urls: Vec<String>,
    /// Owning agent (users.id)
    pub agent_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Coordinates, when both latitude and longitude are known
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Input for creating a new listing
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub bedrooms: i64,
    #[serde(default)]
    pub bathrooms: i64,
    #[serde(default = "default_property_type")]
    pub property_type: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

fn default_property_type() -> String {
    "apartment".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

/// Partial update for an existing listing.
///
/// Absent fields leave the stored value unchanged. Coordinates cannot be
/// cleared through a patch, only replaced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl ListingPatch {
    /// Apply this patch on top of an existing listing
    pub fn apply(self, listing: &mut Listing) {
        if let Some(title) = self.title {
            listing.title = title;
        }
        if let Some(description) = self.description {
            listing.description = Some(description);
        }
        if let Some(price) = self.price {
            listing.price = price;
        }
        if let Some(bedrooms) = self.bedrooms {
            listing.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = self.bathrooms {
            listing.bathrooms = bathrooms;
        }
        if let Some(property_type) = self.property_type {
            listing.property_type = property_type;
        }
        if let Some(status) = self.status {
            listing.status = status;
        }
        if let Some(address) = self.address {
            listing.address = Some(address);
        }
        if let Some(city) = self.city {
            listing.city = Some(city);
        }
        if let Some(lat) = self.lat {
            listing.lat = Some(lat);
        }
        if let Some(lng) = self.lng {
            listing.lng = Some(lng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing {
            id: 1,
            title: "Two-bed flat".to_string(),
            description: None,
            price: 120_000.0,
            bedrooms: 2,
            bathrooms: 1,
            property_type: "apartment".to_string(),
            status: "active".to_string(),
            address: None,
            city: Some("Nairobi".to_string()),
            lat: Some(-1.286389),
            lng: Some(36.817223),
            image_urls: vec![],
            agent_id: 7,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_coordinates_present() {
        assert_eq!(listing().coordinates(), Some((-1.286389, 36.817223)));
    }

    #[test]
    fn test_coordinates_require_both_axes() {
        let mut l = listing();
        l.lng = None;
        assert_eq!(l.coordinates(), None);
        l.lng = Some(36.8);
        l.lat = None;
        assert_eq!(l.coordinates(), None);
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut l = listing();
        let patch = ListingPatch {
            price: Some(99_000.0),
            status: Some("sold".to_string()),
            ..Default::default()
        };
        patch.apply(&mut l);
        assert_eq!(l.price, 99_000.0);
        assert_eq!(l.status, "sold");
        assert_eq!(l.title, "Two-bed flat");
        assert_eq!(l.bedrooms, 2);
    }

    #[test]
    fn test_new_listing_defaults() {
        let input: NewListing =
            serde_json::from_str(r#"{"title": "Plot", "price": 5000.0}"#).unwrap();
        assert_eq!(input.bedrooms, 0);
        assert_eq!(input.property_type, "apartment");
        assert_eq!(input.status, "active");
    }
}
