//! Domain models
//!
//! Entities for the Hearth marketplace:
//! - User: accounts, with agents as the listing-owning role
//! - Listing: a property offered by an agent
//! - Booking: a date-range booking request against a listing
//! - Message: an inbound inquiry about a listing

pub mod booking;
pub mod listing;
pub mod message;
pub mod user;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use listing::{Listing, ListingPatch, NewListing};
pub use message::{Message, NewMessage};
pub use user::{NewUser, User};
