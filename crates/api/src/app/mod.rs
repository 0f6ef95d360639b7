//! HTTP API application wiring (Axum router + storage wiring).
//!
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and mapping to/from domain types
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use orderdesk_infra::{
    InMemoryUnitOfWorkFactory, PostgresUnitOfWorkFactory, StoreConfig, UnitOfWorkFactory,
};

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router for the configured store (public entrypoint used by `main.rs`).
pub async fn build_app(store: &StoreConfig) -> anyhow::Result<Router> {
    match store {
        StoreConfig::InMemory => {
            tracing::warn!("DATABASE_URL not set; orders are kept in memory only");
            Ok(build_router(Arc::new(InMemoryUnitOfWorkFactory::new())))
        }
        StoreConfig::Postgres(config) => {
            let factory = PostgresUnitOfWorkFactory::connect(config).await?;
            tracing::info!(?config, "connected to postgres");
            Ok(build_router(Arc::new(factory)))
        }
    }
}

/// Router over any unit-of-work factory (tests pass an in-memory one).
pub fn build_router<F: UnitOfWorkFactory>(factory: Arc<F>) -> Router {
    routes::router::<F>()
        .with_state(factory)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
