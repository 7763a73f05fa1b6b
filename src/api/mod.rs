//! API layer - HTTP handlers and routing
//!
//! Route groups per resource, merged into one router. Browsing listings,
//! sending booking requests, and sending messages are public; everything
//! that manages inventory sits behind bearer-token auth.

pub mod agents;
pub mod auth;
pub mod bookings;
pub mod common;
pub mod health;
pub mod listings;
pub mod messages;
pub mod middleware;
pub mod responses;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Agent routes (need auth and an agent account)
    let agent_routes = Router::new()
        .nest("/bookings", bookings::protected_router())
        .nest("/messages", messages::protected_router())
        .route_layer(axum_middleware::from_fn(middleware::require_agent))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth; ownership is checked per operation)
    let protected_routes = Router::new()
        .nest("/listings", listings::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .nest("/listings", listings::public_router())
        .nest("/bookings", bookings::public_router())
        .nest("/messages", messages::public_router())
        .nest("/agents", agents::router())
        .merge(agent_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware and static serving
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(build_api_router(state.clone()))
        // Uploaded listing images
        .nest_service("/uploads", ServeDir::new(&state.upload_config.path))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
