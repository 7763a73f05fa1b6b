//! Message repository
//!
//! Inquiry messages sent against listings. Rows are immutable once created;
//! agent-facing reads join through listings for ownership scoping.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Message, NewMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

/// Message repository trait
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Create a new message
    async fn create(&self, message: &NewMessage) -> Result<Message>;

    /// Get message by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Message>>;

    /// Messages against the given agent's listings, newest first. Returns
    /// the page and the total.
    async fn list_for_agent(
        &self,
        agent_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Message>, i64)>;
}

/// SQLx-based message repository implementation
pub struct SqlxMessageRepository {
    pool: DynDatabasePool,
}

impl SqlxMessageRepository {
    /// Create a new SQLx message repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DynDatabasePool) -> Arc<dyn MessageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MessageRepository for SqlxMessageRepository {
    async fn create(&self, message: &NewMessage) -> Result<Message> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_message_sqlite(self.pool.as_sqlite().unwrap(), message).await
            }
            DatabaseDriver::Postgres => {
                create_message_postgres(self.pool.as_postgres().unwrap(), message).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Message>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_message_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                get_message_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn list_for_agent(
        &self,
        agent_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Message>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_agent_sqlite(self.pool.as_sqlite().unwrap(), agent_id, page, per_page).await
            }
            DatabaseDriver::Postgres => {
                list_for_agent_postgres(self.pool.as_postgres().unwrap(), agent_id, page, per_page)
                    .await
            }
        }
    }
}

const MESSAGE_COLUMNS: &str = "id, listing_id, name, email, phone, content, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_message_sqlite(pool: &SqlitePool, message: &NewMessage) -> Result<Message> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO messages (listing_id, name, email, phone, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.listing_id)
    .bind(&message.name)
    .bind(&message.email)
    .bind(&message.phone)
    .bind(&message.content)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create message")?;

    Ok(Message {
        id: result.last_insert_rowid(),
        listing_id: message.listing_id,
        name: message.name.clone(),
        email: message.email.clone(),
        phone: message.phone.clone(),
        content: message.content.clone(),
        created_at: now,
    })
}

async fn get_message_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Message>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM messages WHERE id = ?",
        MESSAGE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get message by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_message_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_for_agent_sqlite(
    pool: &SqlitePool,
    agent_id: i64,
    page: i64,
    per_page: i64,
) -> Result<(Vec<Message>, i64)> {
    let offset = (page - 1) * per_page;

    let rows = sqlx::query(&format!(
        "SELECT m.{} FROM messages m \
         JOIN listings l ON l.id = m.listing_id \
         WHERE l.agent_id = ? ORDER BY m.created_at DESC LIMIT ? OFFSET ?",
        MESSAGE_COLUMNS.replace(", ", ", m.")
    ))
    .bind(agent_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list messages for agent")?;

    let messages = rows
        .iter()
        .map(row_to_message_sqlite)
        .collect::<Result<Vec<_>>>()?;

    let total: i64 = sqlx::query(
        "SELECT COUNT(*) as count FROM messages m \
         JOIN listings l ON l.id = m.listing_id WHERE l.agent_id = ?",
    )
    .bind(agent_id)
    .fetch_one(pool)
    .await
    .context("Failed to count messages for agent")?
    .get("count");

    Ok((messages, total))
}

fn row_to_message_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Message> {
    Ok(Message {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn create_message_postgres(pool: &PgPool, message: &NewMessage) -> Result<Message> {
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        INSERT INTO messages (listing_id, name, email, phone, content, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(message.listing_id)
    .bind(&message.name)
    .bind(&message.email)
    .bind(&message.phone)
    .bind(&message.content)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create message")?;

    Ok(Message {
        id: row.get("id"),
        listing_id: message.listing_id,
        name: message.name.clone(),
        email: message.email.clone(),
        phone: message.phone.clone(),
        content: message.content.clone(),
        created_at: now,
    })
}

async fn get_message_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Message>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM messages WHERE id = $1",
        MESSAGE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get message by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_message_postgres(&row)?)),
        None => Ok(None),
    }
}

async fn list_for_agent_postgres(
    pool: &PgPool,
    agent_id: i64,
    page: i64,
    per_page: i64,
) -> Result<(Vec<Message>, i64)> {
    let offset = (page - 1) * per_page;

    let rows = sqlx::query(&format!(
        "SELECT m.{} FROM messages m \
         JOIN listings l ON l.id = m.listing_id \
         WHERE l.agent_id = $1 ORDER BY m.created_at DESC LIMIT $2 OFFSET $3",
        MESSAGE_COLUMNS.replace(", ", ", m.")
    ))
    .bind(agent_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list messages for agent")?;

    let messages = rows
        .iter()
        .map(row_to_message_postgres)
        .collect::<Result<Vec<_>>>()?;

    let total: i64 = sqlx::query(
        "SELECT COUNT(*) as count FROM messages m \
         JOIN listings l ON l.id = m.listing_id WHERE l.agent_id = $1",
    )
    .bind(agent_id)
    .fetch_one(pool)
    .await
    .context("Failed to count messages for agent")?
    .get("count");

    Ok((messages, total))
}

fn row_to_message_postgres(row: &sqlx::postgres::PgRow) -> Result<Message> {
    Ok(Message {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::listing::{ListingRepository, SqlxListingRepository};
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{NewListing, NewUser};
    use crate::services::password::hash_password;

    async fn setup() -> (DynDatabasePool, SqlxMessageRepository, i64, i64) {
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

        let repo = SqlxMessageRepository::new(pool.clone());
        (pool, repo, agent.id, listing.id)
    }

    fn new_message(listing_id: i64, content: &str) -> NewMessage {
        NewMessage {
            listing_id,
            name: "Visitor".to_string(),
            email: Some("visitor@example.com".to_string()),
            phone: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_pool, repo, _agent_id, listing_id) = setup().await;
        let created = repo
            .create(&new_message(listing_id, "Is this still available?"))
            .await
            .unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "Is this still available?");
        assert_eq!(fetched.listing_id, listing_id);
    }

    #[tokio::test]
    async fn test_list_for_agent_scoping_and_total() {
        let (_pool, repo, agent_id, listing_id) = setup().await;
        repo.create(&new_message(listing_id, "first")).await.unwrap();
        repo.create(&new_message(listing_id, "second")).await.unwrap();

        let (items, total) = repo.list_for_agent(agent_id, 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items.len(), 2);

        let (other, other_total) = repo.list_for_agent(agent_id + 1, 1, 20).await.unwrap();
        assert!(other.is_empty());
        assert_eq!(other_total, 0);
    }

    #[tokio::test]
    async fn test_get_missing_message() {
        let (_pool, repo, _agent_id, _listing_id) = setup().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }
}
