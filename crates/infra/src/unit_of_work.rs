//! Transactional scope around repository operations.
//!
//! A request handler begins one unit of work, runs its repository operations
//! through [`UnitOfWork::orders`], then either commits or lets the unit of
//! work go. Commit and rollback consume the unit of work. Dropping it without
//! committing discards every staged change, so an early `?` return can never
//! leave a half-applied request behind.
//!
//! ```ignore
//! let mut uow = factory.begin().await?;
//! let order = OrdersService::new(uow.orders()).pay_order(id).await?;
//! uow.commit().await?;
//! ```

use async_trait::async_trait;

use crate::repository::{OrdersRepository, RepositoryError};

#[async_trait]
pub trait UnitOfWork: Send {
    type Orders: OrdersRepository;

    /// Orders repository bound to this unit of work.
    fn orders(&mut self) -> &mut Self::Orders;

    /// Make every staged change durable at once.
    async fn commit(self) -> Result<(), RepositoryError>;

    /// Discard every staged change.
    async fn rollback(self) -> Result<(), RepositoryError>;
}

/// Source of fresh units of work; one per process, shared by all requests.
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync + 'static {
    type UnitOfWork: UnitOfWork + 'static;

    async fn begin(&self) -> Result<Self::UnitOfWork, RepositoryError>;
}
