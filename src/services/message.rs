//! Message service
//!
//! Inbound inquiry messages. Anyone can send one against an existing
//! listing; only the listing's agent can read it.

use crate::db::repositories::{ListingRepository, MessageRepository};
use crate::models::{Message, NewMessage, User};
use std::sync::Arc;

/// Error types for message service operations
#[derive(Debug, thiserror::Error)]
pub enum MessageServiceError {
    /// Target listing does not exist
    #[error("Listing not found")]
    ListingNotFound,

    /// Message not found
    #[error("Message not found")]
    NotFound,

    /// Caller is not allowed to read the message
    #[error("{0}")]
    Forbidden(String),

    /// Validation error (invalid input)
    #[error("{0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Message service
pub struct MessageService {
    message_repo: Arc<dyn MessageRepository>,
    listing_repo: Arc<dyn ListingRepository>,
}

impl MessageService {
    /// Create a new message service
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        listing_repo: Arc<dyn ListingRepository>,
    ) -> Self {
        Self {
            message_repo,
            listing_repo,
        }
    }

    /// Record an inquiry against a listing
    pub async fn create(&self, input: NewMessage) -> Result<Message, MessageServiceError> {
        if self
            .listing_repo
            .get_by_id(input.listing_id)
            .await?
            .is_none()
        {
            return Err(MessageServiceError::ListingNotFound);
        }

        if input.name.trim().is_empty() || input.content.trim().is_empty() {
            return Err(MessageServiceError::ValidationError(
                "name and content are required".to_string(),
            ));
        }

        let message = self.message_repo.create(&input).await?;
        tracing::info!(
            message_id = message.id,
            listing_id = message.listing_id,
            "Message received"
        );
        Ok(message)
    }

    /// Messages against the caller's listings, newest first
    pub async fn list_for_agent(
        &self,
        caller: &User,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Message>, i64), MessageServiceError> {
        Ok(self
            .message_repo
            .list_for_agent(caller.id, page, per_page)
            .await?)
    }

    /// Get a message, visible only to the agent owning its listing
    pub async fn get_for_agent(
        &self,
        id: i64,
        caller: &User,
    ) -> Result<Message, MessageServiceError> {
        let message = self
            .message_repo
            .get_by_id(id)
            .await?
            .ok_or(MessageServiceError::NotFound)?;

        let listing = self
            .listing_repo
            .get_by_id(message.listing_id)
            .await?
            .ok_or(MessageServiceError::NotFound)?;
        if !caller.owns_listing(listing.agent_id) {
            return Err(MessageServiceError::Forbidden(
                "You do not own this message's listing".to_string(),
            ));
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ListingRepository, SqlxListingRepository, SqlxMessageRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{NewListing, NewUser};
    use crate::services::password::hash_password;

    async fn setup() -> (MessageService, User, User, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let agent = users
            .create(&NewUser {
                name: "Agent".to_string(),
                email: "agent@example.com".to_string(),
                phone: None,
                password_hash: hash_password("pw").unwrap(),
                is_agent: true,
                bio: None,
                company: None,
            })
            .await
            .unwrap();
        let other_agent = users
            .create(&NewUser {
                name: "Other".to_string(),
                email: "other@example.com".to_string(),
                phone: None,
                password_hash: hash_password("pw").unwrap(),
                is_agent: true,
                bio: None,
                company: None,
            })
            .await
            .unwrap();

        let listings = SqlxListingRepository::new(pool.clone());
        let listing = listings
            .create(
                &NewListing {
                    title: "Flat".to_string(),
                    description: None,
                    price: 100.0,
                    bedrooms: 1,
                    bathrooms: 1,
                    property_type: "apartment".to_string(),
                    status: "active".to_string(),
                    address: None,
                    city: None,
                    lat: None,
                    lng: None,
                },
                agent.id,
            )
            .await
            .unwrap();

        let service = MessageService::new(
            SqlxMessageRepository::shared(pool.clone()),
            SqlxListingRepository::shared(pool),
        );
        (service, agent, other_agent, listing.id)
    }

    fn message(listing_id: i64) -> NewMessage {
        NewMessage {
            listing_id,
            name: "Visitor".to_string(),
            email: None,
            phone: None,
            content: "When can I view?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_against_unknown_listing() {
        let (service, _agent, _other, _listing_id) = setup().await;
        let result = service.create(message(404)).await;
        assert!(matches!(result, Err(MessageServiceError::ListingNotFound)));
    }

    #[tokio::test]
    async fn test_create_requires_name_and_content() {
        let (service, _agent, _other, listing_id) = setup().await;
        let mut input = message(listing_id);
        input.content = "  ".to_string();
        let result = service.create(input).await;
        assert!(matches!(result, Err(MessageServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_get_for_agent_ownership() {
        let (service, agent, other_agent, listing_id) = setup().await;
        let created = service.create(message(listing_id)).await.unwrap();

        assert!(service.get_for_agent(created.id, &agent).await.is_ok());
        let result = service.get_for_agent(created.id, &other_agent).await;
        assert!(matches!(result, Err(MessageServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_for_agent() {
        let (service, agent, other_agent, listing_id) = setup().await;
        service.create(message(listing_id)).await.unwrap();
        service.create(message(listing_id)).await.unwrap();

        let (items, total) = service.list_for_agent(&agent, 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items.len(), 2);

        let (_, other_total) = service.list_for_agent(&other_agent, 1, 20).await.unwrap();
        assert_eq!(other_total, 0);
    }
}
