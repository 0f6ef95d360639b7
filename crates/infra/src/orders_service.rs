//! Order lifecycle orchestration.
//!
//! `OrdersService` turns client requests into repository calls. It borrows
//! the repository of the caller's unit of work for the duration of one
//! request and keeps no state of its own; committing is the caller's job.
//!
//! ```text
//! drafts ──validate──▶ items ──Order::place──▶ order ──repo.add──▶ staged
//! id ──repo.get──▶ order ──cancel/pay──▶ status ──repo.update──▶ staged
//! ```

use chrono::{SubsecRound, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use orderdesk_core::{OrderId, ValidationErrors};
use orderdesk_orders::{Order, OrderItemDraft, Transition, validate_items};

use crate::repository::{OrderFilter, OrderUpdate, OrdersRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Order with ID {0} not found")]
    OrderNotFound(OrderId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ServiceResult<T> = Result<T, OrdersServiceError>;

pub struct OrdersService<'a, R: OrdersRepository + ?Sized> {
    repo: &'a mut R,
}

impl<'a, R: OrdersRepository + ?Sized> OrdersService<'a, R> {
    pub fn new(repo: &'a mut R) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn place_order(&mut self, items: Vec<OrderItemDraft>) -> ServiceResult<Order> {
        let items = validate_items(items)?;
        // Microseconds: what TIMESTAMPTZ keeps.
        let order = Order::place(items, Utc::now().trunc_subsecs(6))?;
        self.repo.add(&order).await?;
        info!(order_id = %order.id_typed(), "order placed");
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&mut self, order_id: OrderId) -> ServiceResult<Order> {
        self.repo
            .get(order_id)
            .await?
            .ok_or(OrdersServiceError::OrderNotFound(order_id))
    }

    #[instrument(skip(self, items), fields(order_id = %order_id, item_count = items.len()))]
    pub async fn update_order(
        &mut self,
        order_id: OrderId,
        items: Vec<OrderItemDraft>,
    ) -> ServiceResult<Order> {
        let items = validate_items(items)?;
        let order = self
            .repo
            .update(order_id, OrderUpdate::items(items))
            .await?
            .ok_or(OrdersServiceError::OrderNotFound(order_id))?;
        info!("order items replaced");
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&mut self, order_id: OrderId) -> ServiceResult<()> {
        if !self.repo.delete(order_id).await? {
            return Err(OrdersServiceError::OrderNotFound(order_id));
        }
        info!("order deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&mut self, order_id: OrderId) -> ServiceResult<Order> {
        self.change_status(order_id, Order::cancel).await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn pay_order(&mut self, order_id: OrderId) -> ServiceResult<Order> {
        self.change_status(order_id, Order::pay).await
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &mut self,
        cancelled: Option<bool>,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<Order>> {
        let orders = self.repo.list(&OrderFilter { cancelled, limit }).await?;
        Ok(orders)
    }

    async fn change_status<F>(&mut self, order_id: OrderId, transition: F) -> ServiceResult<Order>
    where
        F: FnOnce(&mut Order) -> Transition + Send,
    {
        let mut order = self.get_order(order_id).await?;
        let t = transition(&mut order);
        if t.follows_lifecycle {
            info!(from = %t.from, to = %t.to, "order status changed");
        } else {
            warn!(from = %t.from, to = %t.to, "order status changed outside the lifecycle");
        }

        self.repo
            .update(order_id, OrderUpdate::status(order.status()))
            .await?
            .ok_or(OrdersServiceError::OrderNotFound(order_id))
    }
}
