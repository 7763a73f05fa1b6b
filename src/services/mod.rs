//! Services module
//!
//! Business logic between the HTTP handlers and the repositories. Each
//! service owns its error enum; the API layer maps those onto HTTP statuses.

pub mod booking;
pub mod geo;
pub mod listing;
pub mod message;
pub mod password;
pub mod token;
pub mod user;

pub use booking::{BookingService, BookingServiceError};
pub use listing::{ListingService, ListingServiceError};
pub use message::{MessageService, MessageServiceError};
pub use token::{TokenError, TokenService};
pub use user::{RegisterInput, UserService, UserServiceError};
