//! API layer - HTTP handlers and routing
//!
//! All resource routes live under `/api/{version}`:
//! - News endpoints, including the nested author, tags and comments views
//! - Author endpoints
//! - Tag endpoints
//! - Comment endpoints
//!
//! `GET /health` sits outside the versioned prefix.

pub mod authors;
pub mod comments;
pub mod common;
pub mod health;
pub mod middleware;
pub mod news;
pub mod responses;
pub mod tags;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, ApiVersion, AppState};

/// Build the versioned API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/news", news::router())
        .nest("/authors", authors::router())
        .nest("/tags", tags::router())
        .nest("/comments", comments::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::api_version,
        ))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let origin = state
        .config
        .server
        .cors_origin
        .parse::<HeaderValue>()
        .context("Invalid CORS origin")?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Ok(Router::new()
        .route("/health", get(health::health))
        .nest("/api/{version}", build_api_router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}
