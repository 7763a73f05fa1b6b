//! Booking repository
//!
//! Database operations for bookings. Agent-facing queries join through
//! listings so an agent only ever sees bookings against their own inventory.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Booking, BookingStatus, NewBooking};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Booking repository trait
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Create a new booking
    async fn create(&self, booking: &NewBooking) -> Result<Booking>;

    /// Get booking by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Booking>>;

    /// Bookings for a listing that currently hold their dates
    /// (status pending or confirmed)
    async fn list_blocking_for_listing(&self, listing_id: i64) -> Result<Vec<Booking>>;

    /// Bookings against the given agent's listings, optionally filtered by
    /// status, ordered start_date descending. Returns the page and the
    /// filtered total.
    async fn list_for_agent(
        &self,
        agent_id: i64,
        status: Option<BookingStatus>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Booking>, i64)>;

    /// Set a booking's status
    async fn update_status(&self, id: i64, status: BookingStatus) -> Result<()>;
}

/// SQLx-based booking repository implementation
pub struct SqlxBookingRepository {
    pool: DynDatabasePool,
}

impl SqlxBookingRepository {
    /// Create a new SQLx booking repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DynDatabasePool) -> Arc<dyn BookingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BookingRepository for SqlxBookingRepository {
    async fn create(&self, booking: &NewBooking) -> Result<Booking> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_booking_sqlite(self.pool.as_sqlite().unwrap(), booking).await
            }
            DatabaseDriver::Postgres => {
                create_booking_postgres(self.pool.as_postgres().unwrap(), booking).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Booking>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_booking_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                get_booking_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn list_blocking_for_listing(&self, listing_id: i64) -> Result<Vec<Booking>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_blocking_sqlite(self.pool.as_sqlite().unwrap(), listing_id).await
            }
            DatabaseDriver::Postgres => {
                list_blocking_postgres(self.pool.as_postgres().unwrap(), listing_id).await
            }
        }
    }

    async fn list_for_agent(
        &self,
        agent_id: i64,
        status: Option<BookingStatus>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Booking>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_agent_sqlite(self.pool.as_sqlite().unwrap(), agent_id, status, page, per_page)
                    .await
            }
            DatabaseDriver::Postgres => {
                list_for_agent_postgres(
                    self.pool.as_postgres().unwrap(),
                    agent_id,
                    status,
                    page,
                    per_page,
                )
                .await
            }
        }
    }

    async fn update_status(&self, id: i64, status: BookingStatus) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_status_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Postgres => {
                update_status_postgres(self.pool.as_postgres().unwrap(), id, status).await
            }
        }
    }
}

const BOOKING_COLUMNS: &str =
    "id, listing_id, guest_name, guest_email, start_date, end_date, status, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_booking_sqlite(pool: &SqlitePool, booking: &NewBooking) -> Result<Booking> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO bookings (listing_id, guest_name, guest_email, start_date, end_date, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(booking.listing_id)
    .bind(&booking.guest_name)
    .bind(&booking.guest_email)
    .bind(booking.start_date)
    .bind(booking.end_date)
    .bind(booking.status.to_string())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create booking")?;

    Ok(Booking {
        id: result.last_insert_rowid(),
        listing_id: booking.listing_id,
        guest_name: booking.guest_name.clone(),
        guest_email: booking.guest_email.clone(),
        start_date: booking.start_date,
        end_date: booking.end_date,
        status: booking.status,
        created_at: now,
    })
}

async fn get_booking_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Booking>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM bookings WHERE id = ?",
        BOOKING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get booking by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_booking_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_blocking_sqlite(pool: &SqlitePool, listing_id: i64) -> Result<Vec<Booking>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM bookings WHERE listing_id = ? AND status IN ('pending', 'confirmed')",
        BOOKING_COLUMNS
    ))
    .bind(listing_id)
    .fetch_all(pool)
    .await
    .context("Failed to list blocking bookings")?;

    rows.iter().map(row_to_booking_sqlite).collect()
}

async fn list_for_agent_sqlite(
    pool: &SqlitePool,
    agent_id: i64,
    status: Option<BookingStatus>,
    page: i64,
    per_page: i64,
) -> Result<(Vec<Booking>, i64)> {
    let offset = (page - 1) * per_page;

    let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
        "SELECT b.{} FROM bookings b \
         JOIN listings l ON l.id = b.listing_id WHERE l.agent_id = ",
        BOOKING_COLUMNS.replace(", ", ", b."),
    ));
    qb.push_bind(agent_id);
    if let Some(status) = status {
        qb.push(" AND b.status = ");
        qb.push_bind(status.to_string());
    }
    qb.push(" ORDER BY b.start_date DESC LIMIT ");
    qb.push_bind(per_page);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list bookings for agent")?;

    let mut bookings = Vec::new();
    for row in rows {
        bookings.push(row_to_booking_sqlite(&row)?);
    }

    let mut count_qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
        "SELECT COUNT(*) as count FROM bookings b \
         JOIN listings l ON l.id = b.listing_id WHERE l.agent_id = ",
    );
    count_qb.push_bind(agent_id);
    if let Some(status) = status {
        count_qb.push(" AND b.status = ");
        count_qb.push_bind(status.to_string());
    }
    let total: i64 = count_qb
        .build()
        .fetch_one(pool)
        .await
        .context("Failed to count bookings for agent")?
        .get("count");

    Ok((bookings, total))
}

async fn update_status_sqlite(pool: &SqlitePool, id: i64, status: BookingStatus) -> Result<()> {
    sqlx::query("UPDATE bookings SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update booking status")?;
    Ok(())
}

fn row_to_booking_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Booking> {
    let status: String = row.get("status");
    Ok(Booking {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        guest_name: row.get("guest_name"),
        guest_email: row.get("guest_email"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: BookingStatus::from_str(&status)?,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn create_booking_postgres(pool: &PgPool, booking: &NewBooking) -> Result<Booking> {
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        INSERT INTO bookings (listing_id, guest_name, guest_email, start_date, end_date, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(booking.listing_id)
    .bind(&booking.guest_name)
    .bind(&booking.guest_email)
    .bind(booking.start_date)
    .bind(booking.end_date)
    .bind(booking.status.to_string())
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create booking")?;

    Ok(Booking {
        id: row.get("id"),
        listing_id: booking.listing_id,
        guest_name: booking.guest_name.clone(),
        guest_email: booking.guest_email.clone(),
        start_date: booking.start_date,
        end_date: booking.end_date,
        status: booking.status,
        created_at: now,
    })
}

async fn get_booking_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Booking>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM bookings WHERE id = $1",
        BOOKING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get booking by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_booking_postgres(&row)?)),
        None => Ok(None),
    }
}

async fn list_blocking_postgres(pool: &PgPool, listing_id: i64) -> Result<Vec<Booking>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM bookings WHERE listing_id = $1 AND status IN ('pending', 'confirmed')",
        BOOKING_COLUMNS
    ))
    .bind(listing_id)
    .fetch_all(pool)
    .await
    .context("Failed to list blocking bookings")?;

    rows.iter().map(row_to_booking_postgres).collect()
}

async fn list_for_agent_postgres(
    pool: &PgPool,
    agent_id: i64,
    status: Option<BookingStatus>,
    page: i64,
    per_page: i64,
) -> Result<(Vec<Booking>, i64)> {
    let offset = (page - 1) * per_page;

    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
        "SELECT b.{} FROM bookings b \
         JOIN listings l ON l.id = b.listing_id WHERE l.agent_id = ",
        BOOKING_COLUMNS.replace(", ", ", b."),
    ));
    qb.push_bind(agent_id);
    if let Some(status) = status {
        qb.push(" AND b.status = ");
        qb.push_bind(status.to_string());
    }
    qb.push(" ORDER BY b.start_date DESC LIMIT ");
    qb.push_bind(per_page);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list bookings for agent")?;

    let mut bookings = Vec::new();
    for row in rows {
        bookings.push(row_to_booking_postgres(&row)?);
    }

    let mut count_qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT COUNT(*) as count FROM bookings b \
         JOIN listings l ON l.id = b.listing_id WHERE l.agent_id = ",
    );
    count_qb.push_bind(agent_id);
    if let Some(status) = status {
        count_qb.push(" AND b.status = ");
        count_qb.push_bind(status.to_string());
    }
    let total: i64 = count_qb
        .build()
        .fetch_one(pool)
        .await
        .context("Failed to count bookings for agent")?
        .get("count");

    Ok((bookings, total))
}

async fn update_status_postgres(pool: &PgPool, id: i64, status: BookingStatus) -> Result<()> {
    sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
        .bind(status.to_string())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update booking status")?;
    Ok(())
}

fn row_to_booking_postgres(row: &sqlx::postgres::PgRow) -> Result<Booking> {
    let status: String = row.get("status");
    Ok(Booking {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        guest_name: row.get("guest_name"),
        guest_email: row.get("guest_email"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: BookingStatus::from_str(&status)?,
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
    use chrono::NaiveDate;

    struct Fixture {
        _pool: DynDatabasePool,
        bookings: SqlxBookingRepository,
        agent_id: i64,
        listing_id: i64,
    }

    async fn setup() -> Fixture {
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

        Fixture {
            bookings: SqlxBookingRepository::new(pool.clone()),
            _pool: pool,
            agent_id: agent.id,
            listing_id: listing.id,
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_booking(listing_id: i64, start: &str, end: &str) -> NewBooking {
        NewBooking {
            listing_id,
            guest_name: "Guest".to_string(),
            guest_email: None,
            start_date: d(start),
            end_date: d(end),
            status: BookingStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_round_trips_dates() {
        let f = setup().await;
        let created = f
            .bookings
            .create(&new_booking(f.listing_id, "2025-12-01", "2025-12-05"))
            .await
            .unwrap();

        let fetched = f.bookings.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.start_date, d("2025-12-01"));
        assert_eq!(fetched.end_date, d("2025-12-05"));
        assert_eq!(fetched.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_blocking_excludes_cancelled() {
        let f = setup().await;
        let booking = f
            .bookings
            .create(&new_booking(f.listing_id, "2025-12-01", "2025-12-05"))
            .await
            .unwrap();
        f.bookings
            .create(&new_booking(f.listing_id, "2026-01-01", "2026-01-02"))
            .await
            .unwrap();

        f.bookings
            .update_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let blocking = f
            .bookings
            .list_blocking_for_listing(f.listing_id)
            .await
            .unwrap();
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].start_date, d("2026-01-01"));
    }

    #[tokio::test]
    async fn test_list_for_agent_orders_by_start_date_desc() {
        let f = setup().await;
        f.bookings
            .create(&new_booking(f.listing_id, "2025-11-01", "2025-11-02"))
            .await
            .unwrap();
        f.bookings
            .create(&new_booking(f.listing_id, "2025-12-01", "2025-12-02"))
            .await
            .unwrap();

        let (items, total) = f
            .bookings
            .list_for_agent(f.agent_id, None, 1, 20)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].start_date, d("2025-12-01"));
        assert_eq!(items[1].start_date, d("2025-11-01"));
    }

    #[tokio::test]
    async fn test_list_for_agent_status_filter() {
        let f = setup().await;
        let confirmed = f
            .bookings
            .create(&new_booking(f.listing_id, "2025-11-01", "2025-11-02"))
            .await
            .unwrap();
        f.bookings
            .create(&new_booking(f.listing_id, "2025-12-01", "2025-12-02"))
            .await
            .unwrap();
        f.bookings
            .update_status(confirmed.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        let (items, total) = f
            .bookings
            .list_for_agent(f.agent_id, Some(BookingStatus::Confirmed), 1, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, confirmed.id);
    }

    #[tokio::test]
    async fn test_list_for_agent_is_scoped_to_own_listings() {
        let f = setup().await;
        f.bookings
            .create(&new_booking(f.listing_id, "2025-11-01", "2025-11-02"))
            .await
            .unwrap();

        let (items, total) = f
            .bookings
            .list_for_agent(f.agent_id + 99, None, 1, 20)
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 0);
    }
}
