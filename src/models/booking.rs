//! Booking model
//!
//! A date-range booking request against a listing. Date ranges are inclusive
//! on both ends; a single-day booking has start_date == end_date.
//!
//! Invariant: no two bookings with status pending or confirmed for the same
//! listing may have overlapping ranges. The check lives in
//! `services::booking`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Booking entity for a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: i64,
    /// Booked listing (listings.id)
    pub listing_id: i64,
    /// Guest display name
    pub guest_name: String,
    /// Guest contact email
    pub guest_email: Option<String>,
    /// First booked day (inclusive)
    pub start_date: NaiveDate,
    /// Last booked day (inclusive)
    pub end_date: NaiveDate,
    /// Booking status
    pub status: BookingStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Whether this booking still holds its dates.
    ///
    /// Cancelled bookings release their range and never block new ones.
    pub fn blocks_dates(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Whether this booking's range overlaps the given inclusive range
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        ranges_overlap(self.start_date, self.end_date, start, end)
    }
}

/// Two inclusive date ranges overlap iff they share at least one day.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    !(a_end < b_start || b_end < a_start)
}

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Awaiting agent confirmation (default)
    #[default]
    Pending,
    /// Confirmed by the owning agent
    Confirmed,
    /// Cancelled, no longer blocking dates
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid booking status: {}", s)),
        }
    }
}

/// Input for creating a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub listing_id: i64,
    pub guest_name: String,
    pub guest_email: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_overlap_shared_days() {
        assert!(ranges_overlap(
            d("2025-12-01"),
            d("2025-12-05"),
            d("2025-12-03"),
            d("2025-12-06")
        ));
    }

    #[test]
    fn test_overlap_touching_endpoints() {
        // Inclusive ranges: sharing a single boundary day is an overlap
        assert!(ranges_overlap(
            d("2025-12-01"),
            d("2025-12-05"),
            d("2025-12-05"),
            d("2025-12-08")
        ));
    }

    #[test]
    fn test_no_overlap_disjoint() {
        assert!(!ranges_overlap(
            d("2025-12-01"),
            d("2025-12-05"),
            d("2025-12-06"),
            d("2025-12-08")
        ));
    }

    #[test]
    fn test_single_day_ranges() {
        assert!(ranges_overlap(
            d("2025-12-03"),
            d("2025-12-03"),
            d("2025-12-01"),
            d("2025-12-05")
        ));
        assert!(!ranges_overlap(
            d("2025-12-03"),
            d("2025-12-03"),
            d("2025-12-04"),
            d("2025-12-04")
        ));
    }

    #[test]
    fn test_cancelled_does_not_block() {
        let booking = Booking {
            id: 1,
            listing_id: 1,
            guest_name: "Guest".to_string(),
            guest_email: None,
            start_date: d("2025-12-01"),
            end_date: d("2025-12-05"),
            status: BookingStatus::Cancelled,
            created_at: Utc::now(),
        };
        assert!(!booking.blocks_dates());
        // The overlap predicate itself is status-blind
        assert!(booking.overlaps(d("2025-12-02"), d("2025-12-03")));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(
                BookingStatus::from_str(&status.to_string()).unwrap(),
                status
            );
        }
        assert!(BookingStatus::from_str("paid").is_err());
    }
}
