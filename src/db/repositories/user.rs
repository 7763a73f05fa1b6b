//! User repository
//!
//! Database operations for user accounts, including the agent directory
//! queries (search over name/email/company).

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{NewUser, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &NewUser) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get an agent (is_agent = true) by ID
    async fn get_agent_by_id(&self, id: i64) -> Result<Option<User>>;

    /// List agents with optional case-insensitive substring search over
    /// name, email and company. Returns the page and the filtered total.
    async fn list_agents(
        &self,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<User>, i64)>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Postgres => {
                create_user_postgres(self.pool.as_postgres().unwrap(), user).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                get_user_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Postgres => {
                get_user_by_email_postgres(self.pool.as_postgres().unwrap(), email).await
            }
        }
    }

    async fn get_agent_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.get_by_id(id).await?.filter(|u| u.is_agent))
    }

    async fn list_agents(
        &self,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<User>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_agents_sqlite(self.pool.as_sqlite().unwrap(), search, page, per_page).await
            }
            DatabaseDriver::Postgres => {
                list_agents_postgres(self.pool.as_postgres().unwrap(), search, page, per_page).await
            }
        }
    }
}

const USER_COLUMNS: &str =
    "id, name, email, phone, password_hash, is_agent, bio, company, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &NewUser) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, phone, password_hash, is_agent, bio, company, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.password_hash)
    .bind(user.is_agent)
    .bind(&user.bio)
    .bind(&user.company)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    Ok(User {
        id,
        name: user.name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        password_hash: user.password_hash.clone(),
        is_agent: user.is_agent,
        bio: user.bio.clone(),
        company: user.company.clone(),
        created_at: now,
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_agents_sqlite(
    pool: &SqlitePool,
    search: Option<&str>,
    page: i64,
    per_page: i64,
) -> Result<(Vec<User>, i64)> {
    let offset = (page - 1) * per_page;

    let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
        "SELECT {} FROM users WHERE is_agent = 1",
        USER_COLUMNS
    ));
    push_agent_search_sqlite(&mut qb, search);
    qb.push(" ORDER BY name ASC LIMIT ");
    qb.push_bind(per_page);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list agents")?;

    let mut agents = Vec::new();
    for row in rows {
        agents.push(row_to_user_sqlite(&row)?);
    }

    let mut count_qb =
        sqlx::QueryBuilder::<sqlx::Sqlite>::new("SELECT COUNT(*) as count FROM users WHERE is_agent = 1");
    push_agent_search_sqlite(&mut count_qb, search);
    let total: i64 = count_qb
        .build()
        .fetch_one(pool)
        .await
        .context("Failed to count agents")?
        .get("count");

    Ok((agents, total))
}

fn push_agent_search_sqlite(qb: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, search: Option<&str>) {
    if let Some(q) = search {
        let pattern = format!("%{}%", q);
        qb.push(" AND (name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR email LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR company LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        is_agent: row.get("is_agent"),
        bio: row.get("bio"),
        company: row.get("company"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn create_user_postgres(pool: &PgPool, user: &NewUser) -> Result<User> {
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        INSERT INTO users (name, email, phone, password_hash, is_agent, bio, company, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.password_hash)
    .bind(user.is_agent)
    .bind(&user.bio)
    .bind(&user.company)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create user")?;

    let id: i64 = row.get("id");

    Ok(User {
        id,
        name: user.name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        password_hash: user.password_hash.clone(),
        is_agent: user.is_agent,
        bio: user.bio.clone(),
        company: user.company.clone(),
        created_at: now,
    })
}

async fn get_user_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_postgres(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_postgres(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_postgres(&row)?)),
        None => Ok(None),
    }
}

async fn list_agents_postgres(
    pool: &PgPool,
    search: Option<&str>,
    page: i64,
    per_page: i64,
) -> Result<(Vec<User>, i64)> {
    let offset = (page - 1) * per_page;

    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
        "SELECT {} FROM users WHERE is_agent = TRUE",
        USER_COLUMNS
    ));
    push_agent_search_postgres(&mut qb, search);
    qb.push(" ORDER BY name ASC LIMIT ");
    qb.push_bind(per_page);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list agents")?;

    let mut agents = Vec::new();
    for row in rows {
        agents.push(row_to_user_postgres(&row)?);
    }

    let mut count_qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT COUNT(*) as count FROM users WHERE is_agent = TRUE",
    );
    push_agent_search_postgres(&mut count_qb, search);
    let total: i64 = count_qb
        .build()
        .fetch_one(pool)
        .await
        .context("Failed to count agents")?
        .get("count");

    Ok((agents, total))
}

fn push_agent_search_postgres(qb: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, search: Option<&str>) {
    if let Some(q) = search {
        let pattern = format!("%{}%", q);
        qb.push(" AND (name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR email ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR company ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

fn row_to_user_postgres(row: &sqlx::postgres::PgRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        is_agent: row.get("is_agent"),
        bio: row.get("bio"),
        company: row.get("company"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn new_user(name: &str, email: &str, is_agent: bool) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            password_hash: hash_password("test_password").expect("Failed to hash password"),
            is_agent,
            bio: None,
            company: if is_agent {
                Some("Nairobi Homes Ltd".to_string())
            } else {
                None
            },
        }
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&new_user("Alice", "alice@example.com", true))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.name, "Alice");
        assert!(created.is_agent);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;
        let found = repo.get_by_id(999).await.expect("Query failed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&new_user("Bob", "bob@example.com", false))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_email("bob@example.com")
            .await
            .expect("Query failed")
            .expect("User not found");
        assert_eq!(found.name, "Bob");
        assert!(!found.is_agent);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&new_user("First", "dup@example.com", false))
            .await
            .expect("Failed to create first user");
        let result = repo.create(&new_user("Second", "dup@example.com", false)).await;
        assert!(result.is_err(), "Should fail due to duplicate email");
    }

    #[tokio::test]
    async fn test_get_agent_by_id_filters_non_agents() {
        let (_pool, repo) = setup_test_repo().await;
        let guest = repo
            .create(&new_user("Guest", "guest@example.com", false))
            .await
            .unwrap();
        let agent = repo
            .create(&new_user("Agent", "agent@example.com", true))
            .await
            .unwrap();

        assert!(repo.get_agent_by_id(guest.id).await.unwrap().is_none());
        assert!(repo.get_agent_by_id(agent.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_agents_excludes_regular_users() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&new_user("Agent A", "a@example.com", true))
            .await
            .unwrap();
        repo.create(&new_user("Agent B", "b@example.com", true))
            .await
            .unwrap();
        repo.create(&new_user("Guest", "g@example.com", false))
            .await
            .unwrap();

        let (agents, total) = repo.list_agents(None, 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert!(agents.iter().all(|a| a.is_agent));
    }

    #[tokio::test]
    async fn test_list_agents_search_matches_company() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&new_user("Agent A", "a@example.com", true))
            .await
            .unwrap();

        let (found, total) = repo.list_agents(Some("nairobi"), 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].name, "Agent A");

        let (_, miss) = repo.list_agents(Some("mombasa"), 1, 20).await.unwrap();
        assert_eq!(miss, 0);
    }

    #[tokio::test]
    async fn test_list_agents_pagination() {
        let (_pool, repo) = setup_test_repo().await;
        for i in 0..5 {
            repo.create(&new_user(
                &format!("Agent {}", i),
                &format!("agent{}@example.com", i),
                true,
            ))
            .await
            .unwrap();
        }

        let (page1, total) = repo.list_agents(None, 1, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page1.len(), 2);

        let (page3, _) = repo.list_agents(None, 3, 2).await.unwrap();
        assert_eq!(page3.len(), 1);
    }
}
