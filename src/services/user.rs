//! User service
//!
//! Registration, login, and the agent directory. Passwords are hashed on the
//! way in and never leave the service; login failures are indistinguishable
//! between unknown email and wrong password.

use crate::db::repositories::{ListingRepository, UserRepository};
use crate::models::{Listing, NewUser, User};
use crate::services::password::{hash_password, verify_password};
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Required fields absent from the registration input
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Email already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Authentication failed (invalid credentials)
    #[error("Invalid credentials")]
    AuthenticationError,

    /// Agent not found
    #[error("Agent not found")]
    AgentNotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Registration input
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_agent: bool,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// An agent directory entry with its listing count
#[derive(Debug, Clone)]
pub struct AgentSummary {
    pub agent: User,
    pub listing_count: i64,
}

/// User service for accounts and the agent directory
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    listing_repo: Arc<dyn ListingRepository>,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        listing_repo: Arc<dyn ListingRepository>,
    ) -> Self {
        Self {
            user_repo,
            listing_repo,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `MissingFields` when name, email, or password is absent or blank
    /// - `EmailTaken` when the email is already registered
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let mut missing = Vec::new();
        let name = match input.name.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                missing.push("name".to_string());
                None
            }
        };
        let email = match input.email.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                missing.push("email".to_string());
                None
            }
        };
        let password = match input.password.as_deref() {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                missing.push("password".to_string());
                None
            }
        };
        if !missing.is_empty() {
            return Err(UserServiceError::MissingFields(missing));
        }
        let (name, email, password) = (name.unwrap(), email.unwrap(), password.unwrap());

        if self.user_repo.get_by_email(&email).await?.is_some() {
            return Err(UserServiceError::EmailTaken);
        }

        let password_hash = hash_password(&password)?;
        let user = self
            .user_repo
            .create(&NewUser {
                name,
                email,
                phone: input.phone,
                password_hash,
                is_agent: input.is_agent,
                bio: input.bio,
                company: input.company,
            })
            .await?;

        tracing::info!(user_id = user.id, is_agent = user.is_agent, "User registered");
        Ok(user)
    }

    /// Authenticate a user by email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or(UserServiceError::AuthenticationError)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(UserServiceError::AuthenticationError);
        }

        Ok(user)
    }

    /// Get a user by id
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.user_repo.get_by_id(id).await?)
    }

    /// List agents with their listing counts
    pub async fn list_agents(
        &self,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<AgentSummary>, i64), UserServiceError> {
        let (agents, total) = self.user_repo.list_agents(search, page, per_page).await?;

        let mut summaries = Vec::with_capacity(agents.len());
        for agent in agents {
            let listing_count = self.listing_repo.count_by_agent(agent.id).await?;
            summaries.push(AgentSummary {
                agent,
                listing_count,
            });
        }

        Ok((summaries, total))
    }

    /// Get an agent with their listings
    pub async fn get_agent(&self, id: i64) -> Result<(User, Vec<Listing>), UserServiceError> {
        let agent = self
            .user_repo
            .get_agent_by_id(id)
            .await?
            .ok_or(UserServiceError::AgentNotFound)?;
        let listings = self.listing_repo.list_by_agent(agent.id).await?;
        Ok((agent, listings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxListingRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        UserService::new(
            SqlxUserRepository::shared(pool.clone()),
            SqlxListingRepository::shared(pool),
        )
    }

    fn input(name: &str, email: &str) -> RegisterInput {
        RegisterInput {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some("hunter2!".to_string()),
            phone: None,
            is_agent: false,
            bio: None,
            company: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let service = setup().await;
        let user = service
            .register(input("Alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(user.name, "Alice");
        assert_ne!(user.password_hash, "hunter2!");

        let logged_in = service.login("alice@example.com", "hunter2!").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let service = setup().await;
        let result = service
            .register(RegisterInput {
                name: Some("Bob".to_string()),
                email: None,
                password: Some("".to_string()),
                phone: None,
                is_agent: false,
                bio: None,
                company: None,
            })
            .await;

        match result {
            Err(UserServiceError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["email".to_string(), "password".to_string()]);
            }
            other => panic!("Expected MissingFields, got {:?}", other.map(|u| u.id)),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = setup().await;
        service
            .register(input("Alice", "alice@example.com"))
            .await
            .unwrap();
        let result = service.register(input("Alice Again", "alice@example.com")).await;
        assert!(matches!(result, Err(UserServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup().await;
        service
            .register(input("Alice", "alice@example.com"))
            .await
            .unwrap();

        let result = service.login("alice@example.com", "wrong").await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError)));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let service = setup().await;
        let result = service.login("nobody@example.com", "hunter2!").await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError)));
    }

    #[tokio::test]
    async fn test_get_agent_rejects_regular_user() {
        let service = setup().await;
        let user = service
            .register(input("Guest", "guest@example.com"))
            .await
            .unwrap();
        let result = service.get_agent(user.id).await;
        assert!(matches!(result, Err(UserServiceError::AgentNotFound)));
    }
}
