//! Orders persistence.
//!
//! `OrdersRepository` is the only way the service touches stored orders. A
//! repository instance always belongs to a unit of work: nothing written
//! through it is durable until that unit of work commits.
//!
//! Two backends:
//! - `in_memory`: shared map + per-unit-of-work overlay (dev/test)
//! - `postgres`: sqlx, one database transaction per unit of work

use async_trait::async_trait;
use thiserror::Error;

use orderdesk_core::{OrderId, ValidationErrors};
use orderdesk_orders::{Order, OrderItem, OrderStatus};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryOrderStore, InMemoryOrdersRepository};
pub use postgres::PostgresOrdersRepository;

/// Repository operation error.
///
/// Infrastructure failures only; "not found" is a normal `None`/`false`
/// result, not an error.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage error in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    /// A stored record no longer satisfies the order invariants.
    #[error("corrupt order record {id}: {reason}")]
    Corrupt { id: OrderId, reason: String },

    #[error("invalid update: {0}")]
    InvalidUpdate(#[from] ValidationErrors),
}

impl RepositoryError {
    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }

    pub fn corrupt(id: OrderId, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            id,
            reason: reason.into(),
        }
    }
}

/// Listing filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// `Some(true)`: cancelled only. `Some(false)`: everything but cancelled.
    pub cancelled: Option<bool>,
    /// Applied after the status filter.
    pub limit: Option<usize>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self.cancelled {
            Some(cancelled) => order.is_cancelled() == cancelled,
            None => true,
        }
    }

    /// Filter + cap a creation-ordered sequence.
    pub fn apply<I>(&self, orders: I) -> Vec<Order>
    where
        I: IntoIterator<Item = Order>,
    {
        let limit = self.limit.unwrap_or(usize::MAX);
        orders
            .into_iter()
            .filter(|o| self.matches(o))
            .take(limit)
            .collect()
    }
}

/// Fields an update may change. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub items: Option<Vec<OrderItem>>,
    pub status: Option<OrderStatus>,
}

impl OrderUpdate {
    pub fn items(items: Vec<OrderItem>) -> Self {
        Self {
            items: Some(items),
            status: None,
        }
    }

    pub fn status(status: OrderStatus) -> Self {
        Self {
            items: None,
            status: Some(status),
        }
    }

    /// The order as it looks after this update.
    pub fn apply_to(self, order: &Order) -> Result<Order, ValidationErrors> {
        let mut updated = match self.status {
            Some(status) if status != order.status() => Order::restore(
                order.id_typed(),
                order.items().to_vec(),
                order.created(),
                status,
            )?,
            _ => order.clone(),
        };
        if let Some(items) = self.items {
            updated.replace_items(items)?;
        }
        Ok(updated)
    }
}

/// Persistence contract for orders.
#[async_trait]
pub trait OrdersRepository: Send {
    async fn add(&mut self, order: &Order) -> Result<(), RepositoryError>;

    async fn get(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Orders in creation order, filtered.
    async fn list(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;

    /// Returns the updated order, `None` if no order has this id.
    async fn update(
        &mut self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Returns whether an order was removed.
    async fn delete(&mut self, id: OrderId) -> Result<bool, RepositoryError>;
}
