//! Listing repository
//!
//! Database operations for property listings, including the filtered search
//! query behind `GET /listings`. Filters compose dynamically per backend;
//! sort columns come from a whitelist, never from raw client input.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Listing, NewListing};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Whitelisted sort for listing queries.
///
/// Parsed from a `sort` query value: a bare field name sorts ascending, a
/// leading `-` sorts descending. Unknown fields are rejected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSort {
    pub field: SortField,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Price,
    Bedrooms,
    Bathrooms,
    Title,
    City,
}

impl SortField {
    fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Price => "price",
            SortField::Bedrooms => "bedrooms",
            SortField::Bathrooms => "bathrooms",
            SortField::Title => "title",
            SortField::City => "city",
        }
    }
}

impl ListingSort {
    /// Parse a client-supplied sort value against the whitelist
    pub fn parse(value: &str) -> Option<Self> {
        let (name, order) = match value.strip_prefix('-') {
            Some(rest) => (rest, SortOrder::Desc),
            None => (value, SortOrder::Asc),
        };
        let field = match name {
            "created_at" => SortField::CreatedAt,
            "price" => SortField::Price,
            "bedrooms" => SortField::Bedrooms,
            "bathrooms" => SortField::Bathrooms,
            "title" => SortField::Title,
            "city" => SortField::City,
            _ => return None,
        };
        Some(Self { field, order })
    }

    fn sql(&self) -> String {
        let dir = match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        format!("{} {}", self.field.column(), dir)
    }
}

impl Default for ListingSort {
    /// Newest first
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// Filter set for listing queries
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Case-insensitive substring match on city
    pub city: Option<String>,
    /// Exact match on property type
    pub property_type: Option<String>,
    /// Exact match on status
    pub status: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Minimum number of bedrooms
    pub bedrooms: Option<i64>,
    /// Minimum number of bathrooms
    pub bathrooms: Option<i64>,
    pub sort: ListingSort,
    pub page: i64,
    pub per_page: i64,
}

/// Listing repository trait
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Create a new listing owned by the given agent
    async fn create(&self, listing: &NewListing, agent_id: i64) -> Result<Listing>;

    /// Get listing by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Listing>>;

    /// Persist the full field set of an already-loaded listing
    async fn update(&self, listing: &Listing) -> Result<()>;

    /// Delete a listing. Returns false when no row matched.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Filtered, sorted, paginated listing query. Returns the page and the
    /// filtered total.
    async fn list(&self, filter: &ListingFilter) -> Result<(Vec<Listing>, i64)>;

    /// All listings with both coordinates set, for geo search
    async fn list_geocoded(&self) -> Result<Vec<Listing>>;

    /// All listings owned by the given agent, newest first
    async fn list_by_agent(&self, agent_id: i64) -> Result<Vec<Listing>>;

    /// Number of listings owned by the given agent
    async fn count_by_agent(&self, agent_id: i64) -> Result<i64>;
}

/// SQLx-based listing repository implementation
pub struct SqlxListingRepository {
    pool: DynDatabasePool,
}

impl SqlxListingRepository {
    /// Create a new SQLx listing repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DynDatabasePool) -> Arc<dyn ListingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ListingRepository for SqlxListingRepository {
    async fn create(&self, listing: &NewListing, agent_id: i64) -> Result<Listing> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_listing_sqlite(self.pool.as_sqlite().unwrap(), listing, agent_id).await
            }
            DatabaseDriver::Postgres => {
                create_listing_postgres(self.pool.as_postgres().unwrap(), listing, agent_id).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_listing_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                get_listing_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn update(&self, listing: &Listing) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_listing_sqlite(self.pool.as_sqlite().unwrap(), listing).await
            }
            DatabaseDriver::Postgres => {
                update_listing_postgres(self.pool.as_postgres().unwrap(), listing).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_listing_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                delete_listing_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn list(&self, filter: &ListingFilter) -> Result<(Vec<Listing>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_listings_sqlite(self.pool.as_sqlite().unwrap(), filter).await
            }
            DatabaseDriver::Postgres => {
                list_listings_postgres(self.pool.as_postgres().unwrap(), filter).await
            }
        }
    }

    async fn list_geocoded(&self) -> Result<Vec<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_geocoded_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Postgres => {
                list_geocoded_postgres(self.pool.as_postgres().unwrap()).await
            }
        }
    }

    async fn list_by_agent(&self, agent_id: i64) -> Result<Vec<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_agent_sqlite(self.pool.as_sqlite().unwrap(), agent_id).await
            }
            DatabaseDriver::Postgres => {
                list_by_agent_postgres(self.pool.as_postgres().unwrap(), agent_id).await
            }
        }
    }

    async fn count_by_agent(&self, agent_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_by_agent_sqlite(self.pool.as_sqlite().unwrap(), agent_id).await
            }
            DatabaseDriver::Postgres => {
                count_by_agent_postgres(self.pool.as_postgres().unwrap(), agent_id).await
            }
        }
    }
}

const LISTING_COLUMNS: &str = "id, title, description, price, bedrooms, bathrooms, \
    property_type, status, address, city, lat, lng, image_urls, agent_id, created_at";

fn encode_image_urls(urls: &[String]) -> Result<String> {
    serde_json::to_string(urls).context("Failed to encode image URLs")
}

fn decode_image_urls(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_listing_sqlite(
    pool: &SqlitePool,
    listing: &NewListing,
    agent_id: i64,
) -> Result<Listing> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO listings (title, description, price, bedrooms, bathrooms,
            property_type, status, address, city, lat, lng, image_urls, agent_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', ?, ?)
        "#,
    )
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(listing.price)
    .bind(listing.bedrooms)
    .bind(listing.bathrooms)
    .bind(&listing.property_type)
    .bind(&listing.status)
    .bind(&listing.address)
    .bind(&listing.city)
    .bind(listing.lat)
    .bind(listing.lng)
    .bind(agent_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create listing")?;

    Ok(materialize_new_listing(
        result.last_insert_rowid(),
        listing,
        agent_id,
        now,
    ))
}

async fn get_listing_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Listing>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE id = ?",
        LISTING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get listing by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_listing_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_listing_sqlite(pool: &SqlitePool, listing: &Listing) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE listings SET title = ?, description = ?, price = ?, bedrooms = ?,
            bathrooms = ?, property_type = ?, status = ?, address = ?, city = ?,
            lat = ?, lng = ?, image_urls = ?
        WHERE id = ?
        "#,
    )
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(listing.price)
    .bind(listing.bedrooms)
    .bind(listing.bathrooms)
    .bind(&listing.property_type)
    .bind(&listing.status)
    .bind(&listing.address)
    .bind(&listing.city)
    .bind(listing.lat)
    .bind(listing.lng)
    .bind(encode_image_urls(&listing.image_urls)?)
    .bind(listing.id)
    .execute(pool)
    .await
    .context("Failed to update listing")?;

    Ok(())
}

async fn delete_listing_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete listing")?;
    Ok(result.rows_affected() > 0)
}

fn push_filters_sqlite(qb: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, filter: &ListingFilter) {
    if let Some(city) = &filter.city {
        qb.push(" AND city LIKE ");
        qb.push_bind(format!("%{}%", city));
    }
    if let Some(property_type) = &filter.property_type {
        qb.push(" AND property_type = ");
        qb.push_bind(property_type.clone());
    }
    if let Some(status) = &filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status.clone());
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND price >= ");
        qb.push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND price <= ");
        qb.push_bind(max_price);
    }
    if let Some(bedrooms) = filter.bedrooms {
        qb.push(" AND bedrooms >= ");
        qb.push_bind(bedrooms);
    }
    if let Some(bathrooms) = filter.bathrooms {
        qb.push(" AND bathrooms >= ");
        qb.push_bind(bathrooms);
    }
}

async fn list_listings_sqlite(
    pool: &SqlitePool,
    filter: &ListingFilter,
) -> Result<(Vec<Listing>, i64)> {
    let offset = (filter.page - 1) * filter.per_page;

    let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
        "SELECT {} FROM listings WHERE 1=1",
        LISTING_COLUMNS
    ));
    push_filters_sqlite(&mut qb, filter);
    qb.push(format!(" ORDER BY {} LIMIT ", filter.sort.sql()));
    qb.push_bind(filter.per_page);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list listings")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_sqlite(&row)?);
    }

    let mut count_qb =
        sqlx::QueryBuilder::<sqlx::Sqlite>::new("SELECT COUNT(*) as count FROM listings WHERE 1=1");
    push_filters_sqlite(&mut count_qb, filter);
    let total: i64 = count_qb
        .build()
        .fetch_one(pool)
        .await
        .context("Failed to count listings")?
        .get("count");

    Ok((listings, total))
}

async fn list_geocoded_sqlite(pool: &SqlitePool) -> Result<Vec<Listing>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE lat IS NOT NULL AND lng IS NOT NULL",
        LISTING_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list geocoded listings")?;

    rows.iter().map(row_to_listing_sqlite).collect()
}

async fn list_by_agent_sqlite(pool: &SqlitePool, agent_id: i64) -> Result<Vec<Listing>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE agent_id = ? ORDER BY created_at DESC",
        LISTING_COLUMNS
    ))
    .bind(agent_id)
    .fetch_all(pool)
    .await
    .context("Failed to list listings by agent")?;

    rows.iter().map(row_to_listing_sqlite).collect()
}

async fn count_by_agent_sqlite(pool: &SqlitePool, agent_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM listings WHERE agent_id = ?")
        .bind(agent_id)
        .fetch_one(pool)
        .await
        .context("Failed to count listings by agent")?;
    Ok(row.get("count"))
}

fn row_to_listing_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Listing> {
    let image_urls: String = row.get("image_urls");
    Ok(Listing {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        bedrooms: row.get("bedrooms"),
        bathrooms: row.get("bathrooms"),
        property_type: row.get("property_type"),
        status: row.get("status"),
        address: row.get("address"),
        city: row.get("city"),
        lat: row.get("lat"),
        lng: row.get("lng"),
        image_urls: decode_image_urls(&image_urls),
        agent_id: row.get("agent_id"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn create_listing_postgres(
    pool: &PgPool,
    listing: &NewListing,
    agent_id: i64,
) -> Result<Listing> {
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        INSERT INTO listings (title, description, price, bedrooms, bathrooms,
            property_type, status, address, city, lat, lng, image_urls, agent_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, '[]', $12, $13)
        RETURNING id
        "#,
    )
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(listing.price)
    .bind(listing.bedrooms)
    .bind(listing.bathrooms)
    .bind(&listing.property_type)
    .bind(&listing.status)
    .bind(&listing.address)
    .bind(&listing.city)
    .bind(listing.lat)
    .bind(listing.lng)
    .bind(agent_id)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create listing")?;

    Ok(materialize_new_listing(row.get("id"), listing, agent_id, now))
}

async fn get_listing_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Listing>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE id = $1",
        LISTING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get listing by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_listing_postgres(&row)?)),
        None => Ok(None),
    }
}

async fn update_listing_postgres(pool: &PgPool, listing: &Listing) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE listings SET title = $1, description = $2, price = $3, bedrooms = $4,
            bathrooms = $5, property_type = $6, status = $7, address = $8, city = $9,
            lat = $10, lng = $11, image_urls = $12
        WHERE id = $13
        "#,
    )
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(listing.price)
    .bind(listing.bedrooms)
    .bind(listing.bathrooms)
    .bind(&listing.property_type)
    .bind(&listing.status)
    .bind(&listing.address)
    .bind(&listing.city)
    .bind(listing.lat)
    .bind(listing.lng)
    .bind(encode_image_urls(&listing.image_urls)?)
    .bind(listing.id)
    .execute(pool)
    .await
    .context("Failed to update listing")?;

    Ok(())
}

async fn delete_listing_postgres(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete listing")?;
    Ok(result.rows_affected() > 0)
}

fn push_filters_postgres(qb: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, filter: &ListingFilter) {
    if let Some(city) = &filter.city {
        qb.push(" AND city ILIKE ");
        qb.push_bind(format!("%{}%", city));
    }
    if let Some(property_type) = &filter.property_type {
        qb.push(" AND property_type = ");
        qb.push_bind(property_type.clone());
    }
    if let Some(status) = &filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status.clone());
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND price >= ");
        qb.push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND price <= ");
        qb.push_bind(max_price);
    }
    if let Some(bedrooms) = filter.bedrooms {
        qb.push(" AND bedrooms >= ");
        qb.push_bind(bedrooms);
    }
    if let Some(bathrooms) = filter.bathrooms {
        qb.push(" AND bathrooms >= ");
        qb.push_bind(bathrooms);
    }
}

async fn list_listings_postgres(
    pool: &PgPool,
    filter: &ListingFilter,
) -> Result<(Vec<Listing>, i64)> {
    let offset = (filter.page - 1) * filter.per_page;

    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
        "SELECT {} FROM listings WHERE 1=1",
        LISTING_COLUMNS
    ));
    push_filters_postgres(&mut qb, filter);
    qb.push(format!(" ORDER BY {} LIMIT ", filter.sort.sql()));
    qb.push_bind(filter.per_page);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list listings")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_postgres(&row)?);
    }

    let mut count_qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT COUNT(*) as count FROM listings WHERE 1=1",
    );
    push_filters_postgres(&mut count_qb, filter);
    let total: i64 = count_qb
        .build()
        .fetch_one(pool)
        .await
        .context("Failed to count listings")?
        .get("count");

    Ok((listings, total))
}

async fn list_geocoded_postgres(pool: &PgPool) -> Result<Vec<Listing>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE lat IS NOT NULL AND lng IS NOT NULL",
        LISTING_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list geocoded listings")?;

    rows.iter().map(row_to_listing_postgres).collect()
}

async fn list_by_agent_postgres(pool: &PgPool, agent_id: i64) -> Result<Vec<Listing>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE agent_id = $1 ORDER BY created_at DESC",
        LISTING_COLUMNS
    ))
    .bind(agent_id)
    .fetch_all(pool)
    .await
    .context("Failed to list listings by agent")?;

    rows.iter().map(row_to_listing_postgres).collect()
}

async fn count_by_agent_postgres(pool: &PgPool, agent_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM listings WHERE agent_id = $1")
        .bind(agent_id)
        .fetch_one(pool)
        .await
        .context("Failed to count listings by agent")?;
    Ok(row.get("count"))
}

fn row_to_listing_postgres(row: &sqlx::postgres::PgRow) -> Result<Listing> {
    let image_urls: String = row.get("image_urls");
    Ok(Listing {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        bedrooms: row.get("bedrooms"),
        bathrooms: row.get("bathrooms"),
        property_type: row.get("property_type"),
        status: row.get("status"),
        address: row.get("address"),
        city: row.get("city"),
        lat: row.get("lat"),
        lng: row.get("lng"),
        image_urls: decode_image_urls(&image_urls),
        agent_id: row.get("agent_id"),
        created_at: row.get("created_at"),
    })
}

fn materialize_new_listing(
    id: i64,
    listing: &NewListing,
    agent_id: i64,
    created_at: chrono::DateTime<Utc>,
) -> Listing {
    Listing {
        id,
        title: listing.title.clone(),
        description: listing.description.clone(),
        price: listing.price,
        bedrooms: listing.bedrooms,
        bathrooms: listing.bathrooms,
        property_type: listing.property_type.clone(),
        status: listing.status.clone(),
        address: listing.address.clone(),
        city: listing.city.clone(),
        lat: listing.lat,
        lng: listing.lng,
        image_urls: Vec::new(),
        agent_id,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::NewUser;
    use crate::services::password::hash_password;

    async fn setup() -> (DynDatabasePool, SqlxListingRepository, i64) {
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
            .expect("Failed to create agent");

        let repo = SqlxListingRepository::new(pool.clone());
        (pool, repo, agent.id)
    }

    fn new_listing(title: &str, city: &str, price: f64) -> NewListing {
        NewListing {
            title: title.to_string(),
            description: None,
            price,
            bedrooms: 2,
            bathrooms: 1,
            property_type: "apartment".to_string(),
            status: "active".to_string(),
            address: None,
            city: Some(city.to_string()),
            lat: None,
            lng: None,
        }
    }

    fn default_filter() -> ListingFilter {
        ListingFilter {
            page: 1,
            per_page: 20,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_pool, repo, agent_id) = setup().await;
        let created = repo
            .create(&new_listing("Loft", "Berlin", 250_000.0), agent_id)
            .await
            .unwrap();
        assert!(created.id > 0);
        assert!(created.image_urls.is_empty());

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Loft");
        assert_eq!(fetched.agent_id, agent_id);
    }

    #[tokio::test]
    async fn test_update_persists_image_urls() {
        let (_pool, repo, agent_id) = setup().await;
        let mut listing = repo
            .create(&new_listing("Villa", "Lisbon", 700_000.0), agent_id)
            .await
            .unwrap();

        listing.image_urls.push("/uploads/abc.jpg".to_string());
        listing.price = 650_000.0;
        repo.update(&listing).await.unwrap();

        let fetched = repo.get_by_id(listing.id).await.unwrap().unwrap();
        assert_eq!(fetched.image_urls, vec!["/uploads/abc.jpg".to_string()]);
        assert_eq!(fetched.price, 650_000.0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_pool, repo, agent_id) = setup().await;
        let listing = repo
            .create(&new_listing("Cabin", "Oslo", 90_000.0), agent_id)
            .await
            .unwrap();

        assert!(repo.delete(listing.id).await.unwrap());
        assert!(repo.get_by_id(listing.id).await.unwrap().is_none());
        assert!(!repo.delete(listing.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_city_filter_is_substring_match() {
        let (_pool, repo, agent_id) = setup().await;
        repo.create(&new_listing("A", "Nairobi", 100.0), agent_id)
            .await
            .unwrap();
        repo.create(&new_listing("B", "Mombasa", 200.0), agent_id)
            .await
            .unwrap();

        let filter = ListingFilter {
            city: Some("airob".to_string()),
            ..default_filter()
        };
        let (items, total) = repo.list(&filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "A");
    }

    #[tokio::test]
    async fn test_list_price_range_and_total() {
        let (_pool, repo, agent_id) = setup().await;
        for (title, price) in [("cheap", 50.0), ("mid", 150.0), ("high", 500.0)] {
            repo.create(&new_listing(title, "X", price), agent_id)
                .await
                .unwrap();
        }

        let filter = ListingFilter {
            min_price: Some(100.0),
            max_price: Some(200.0),
            ..default_filter()
        };
        let (items, total) = repo.list(&filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "mid");
    }

    #[tokio::test]
    async fn test_list_sort_by_price_ascending() {
        let (_pool, repo, agent_id) = setup().await;
        repo.create(&new_listing("b", "X", 300.0), agent_id)
            .await
            .unwrap();
        repo.create(&new_listing("a", "X", 100.0), agent_id)
            .await
            .unwrap();

        let filter = ListingFilter {
            sort: ListingSort::parse("price").unwrap(),
            ..default_filter()
        };
        let (items, _) = repo.list(&filter).await.unwrap();
        assert_eq!(items[0].price, 100.0);
        assert_eq!(items[1].price, 300.0);
    }

    #[tokio::test]
    async fn test_list_pagination_total_is_filtered_count() {
        let (_pool, repo, agent_id) = setup().await;
        for i in 0..5 {
            repo.create(&new_listing(&format!("L{}", i), "X", 100.0), agent_id)
                .await
                .unwrap();
        }

        let filter = ListingFilter {
            page: 2,
            per_page: 2,
            ..Default::default()
        };
        let (items, total) = repo.list(&filter).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_list_geocoded_excludes_partial_coordinates() {
        let (_pool, repo, agent_id) = setup().await;
        let mut geo = new_listing("geo", "X", 1.0);
        geo.lat = Some(1.0);
        geo.lng = Some(2.0);
        repo.create(&geo, agent_id).await.unwrap();

        let mut half = new_listing("half", "X", 1.0);
        half.lat = Some(1.0);
        repo.create(&half, agent_id).await.unwrap();

        repo.create(&new_listing("none", "X", 1.0), agent_id)
            .await
            .unwrap();

        let geocoded = repo.list_geocoded().await.unwrap();
        assert_eq!(geocoded.len(), 1);
        assert_eq!(geocoded[0].title, "geo");
    }

    #[tokio::test]
    async fn test_count_by_agent() {
        let (_pool, repo, agent_id) = setup().await;
        repo.create(&new_listing("A", "X", 1.0), agent_id)
            .await
            .unwrap();
        repo.create(&new_listing("B", "X", 1.0), agent_id)
            .await
            .unwrap();

        assert_eq!(repo.count_by_agent(agent_id).await.unwrap(), 2);
        assert_eq!(repo.count_by_agent(agent_id + 1).await.unwrap(), 0);
    }

    #[test]
    fn test_sort_parse_whitelist() {
        let sort = ListingSort::parse("-price").unwrap();
        assert_eq!(sort.field, SortField::Price);
        assert_eq!(sort.order, SortOrder::Desc);

        let sort = ListingSort::parse("city").unwrap();
        assert_eq!(sort.order, SortOrder::Asc);

        assert!(ListingSort::parse("agent_id; DROP TABLE listings").is_none());
        assert!(ListingSort::parse("-unknown").is_none());
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let sort = ListingSort::default();
        assert_eq!(sort.field, SortField::CreatedAt);
        assert_eq!(sort.order, SortOrder::Desc);
    }
}
