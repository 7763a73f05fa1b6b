//! Repositories
//!
//! Data-access traits and their SQLx implementations. Each repository is an
//! `async_trait` trait so services depend on the interface, not the backend;
//! the SQLx implementations dispatch on the configured driver.

pub mod booking;
pub mod listing;
pub mod message;
pub mod user;

pub use booking::{BookingRepository, SqlxBookingRepository};
pub use listing::{ListingFilter, ListingRepository, ListingSort, SortOrder, SqlxListingRepository};
pub use message::{MessageRepository, SqlxMessageRepository};
pub use user::{SqlxUserRepository, UserRepository};
