//! Infrastructure layer: persistence, units of work, order orchestration and
//! storage configuration.

pub mod config;
pub mod orders_service;
pub mod repository;
pub mod unit_of_work;


pub use config::{ConfigError, PostgresConfig, StoreConfig};
pub use orders_service::{OrdersService, OrdersServiceError, ServiceResult};
pub use repository::in_memory::{InMemoryUnitOfWork, InMemoryUnitOfWorkFactory};
pub use repository::postgres::{PostgresUnitOfWork, PostgresUnitOfWorkFactory, ensure_schema};
pub use repository::{
    InMemoryOrderStore, OrderFilter, OrderUpdate, OrdersRepository, RepositoryError,
};
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
