//! Message model
//!
//! An inbound inquiry about a listing, sent by a (possibly anonymous)
//! visitor. Messages are immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message entity for a listing inquiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: i64,
    /// Listing the inquiry is about (listings.id)
    pub listing_id: i64,
    /// Sender display name
    pub name: String,
    /// Sender email
    pub email: Option<String>,
    /// Sender phone number
    pub phone: Option<String>,
    /// Message body
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new message
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub listing_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub content: String,
}
