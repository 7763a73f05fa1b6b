//! User model
//!
//! Defines the User entity. Users flagged `is_agent` are the only role
//! allowed to own and manage listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Phone number
    pub phone: Option<String>,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether this user may own and manage listings
    pub is_agent: bool,
    /// Agent biography
    pub bio: Option<String>,
    /// Agency or company name
    pub company: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check whether this user may manage the given listing
    pub fn owns_listing(&self, agent_id: i64) -> bool {
        self.is_agent && self.id == agent_id
    }
}

/// Input for creating a new user.
///
/// The password should already be hashed before constructing this value;
/// use `services::password::hash_password()`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub is_agent: bool,
    pub bio: Option<String>,
    pub company: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, is_agent: bool) -> User {
        User {
            id,
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            phone: None,
            password_hash: "hash".to_string(),
            is_agent,
            bio: None,
            company: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_agent_owns_own_listing() {
        let agent = user(1, true);
        assert!(agent.owns_listing(1));
        assert!(!agent.owns_listing(2));
    }

    #[test]
    fn test_non_agent_owns_nothing() {
        let guest = user(1, false);
        assert!(!guest.owns_listing(1));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user(1, true)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "test@example.com");
    }
}
