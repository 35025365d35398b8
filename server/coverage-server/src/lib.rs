//! Coverage Server - insurance eligibility and benefit utilization API
//!
//! This library provides the HTTP surface of the coverage engine: insurer,
//! policy and scheme administration, member enrollment, real-time
//! eligibility checks, the benefit utilization ledger and preauthorization
//! lookups.

pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use error::*;
pub use server::CoverageServer;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main application router with all routes and middleware
pub fn create_app(server: CoverageServer) -> Router {
    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(server)
}
