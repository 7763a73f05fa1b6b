//! Hearth - A property listing marketplace backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearth::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxBookingRepository, SqlxListingRepository, SqlxMessageRepository,
            SqlxUserRepository,
        },
    },
    services::{BookingService, ListingService, MessageService, TokenService, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hearth marketplace backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Ensure the upload directory exists before anything is served from it
    tokio::fs::create_dir_all(&config.upload.path).await?;

    // Create repositories
    let user_repo = SqlxUserRepository::shared(pool.clone());
    let listing_repo = SqlxListingRepository::shared(pool.clone());
    let booking_repo = SqlxBookingRepository::shared(pool.clone());
    let message_repo = SqlxMessageRepository::shared(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo, listing_repo.clone()));
    let listing_service = Arc::new(ListingService::new(listing_repo.clone()));
    let booking_service = Arc::new(BookingService::new(booking_repo, listing_repo.clone()));
    let message_service = Arc::new(MessageService::new(message_repo, listing_repo));
    let token_service = TokenService::new(
        config.auth.jwt_secret.clone(),
        config.auth.token_ttl_hours,
    );

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        user_service,
        listing_service,
        booking_service,
        message_service,
        token_service,
        upload_config: Arc::new(config.upload.clone()),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
