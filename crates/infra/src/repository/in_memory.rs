//! In-memory orders storage for tests/dev.
//!
//! Committed state lives in one shared [`InMemoryOrderStore`]. Every unit of
//! work gets its own [`InMemoryOrdersRepository`] holding an overlay of staged
//! writes; reads look at the overlay first and fall back to the committed map.
//! Commit applies the whole overlay under a single write lock. A staged
//! rewrite of an order that another unit of work deleted in the meantime is
//! dropped at commit, so a delete is never undone.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use orderdesk_core::{Entity, OrderId};
use orderdesk_orders::Order;

use super::{OrderFilter, OrderUpdate, OrdersRepository, RepositoryError};
use crate::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// Committed orders, shared by every unit of work.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<BTreeMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed orders.
    pub fn len(&self) -> Result<usize, RepositoryError> {
        let map = self
            .inner
            .read()
            .map_err(|_| RepositoryError::storage("len", "order store lock poisoned"))?;
        Ok(map.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }

    fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let map = self
            .inner
            .read()
            .map_err(|_| RepositoryError::storage("get", "order store lock poisoned"))?;
        Ok(map.get(id).cloned())
    }

    fn snapshot(&self) -> Result<BTreeMap<OrderId, Order>, RepositoryError> {
        let map = self
            .inner
            .read()
            .map_err(|_| RepositoryError::storage("list", "order store lock poisoned"))?;
        Ok(map.clone())
    }

    /// Apply staged changes. `added` holds the ids the unit of work inserted;
    /// any other staged write only lands if the order is still committed.
    fn apply(
        &self,
        staged: BTreeMap<OrderId, Option<Order>>,
        added: &BTreeSet<OrderId>,
    ) -> Result<(), RepositoryError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| RepositoryError::storage("commit", "order store lock poisoned"))?;
        for (id, change) in staged {
            match change {
                Some(order) if added.contains(&id) || map.contains_key(&id) => {
                    map.insert(id, order);
                }
                Some(_) => {
                    tracing::warn!(order_id = %id, "dropping write to an order deleted concurrently");
                }
                None => {
                    map.remove(&id);
                }
            }
        }
        Ok(())
    }
}

/// Repository view of the store for one unit of work.
#[derive(Debug)]
pub struct InMemoryOrdersRepository {
    store: Arc<InMemoryOrderStore>,
    /// `Some` = written, `None` = deleted.
    staged: BTreeMap<OrderId, Option<Order>>,
    /// Ids inserted by this unit of work.
    added: BTreeSet<OrderId>,
}

impl InMemoryOrdersRepository {
    fn new(store: Arc<InMemoryOrderStore>) -> Self {
        Self {
            store,
            staged: BTreeMap::new(),
            added: BTreeSet::new(),
        }
    }

    /// Number of writes waiting for commit.
    pub fn pending_changes(&self) -> usize {
        self.staged.len()
    }

    fn current(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        match self.staged.get(&id) {
            Some(change) => Ok(change.clone()),
            None => self.store.get(&id),
        }
    }
}

#[async_trait]
impl OrdersRepository for InMemoryOrdersRepository {
    async fn add(&mut self, order: &Order) -> Result<(), RepositoryError> {
        self.added.insert(*order.id());
        self.staged.insert(*order.id(), Some(order.clone()));
        Ok(())
    }

    async fn get(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.current(id)
    }

    async fn list(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let mut merged = self.store.snapshot()?;
        for (id, change) in &self.staged {
            match change {
                Some(order) => {
                    merged.insert(*id, order.clone());
                }
                None => {
                    merged.remove(id);
                }
            }
        }

        let mut orders: Vec<Order> = merged.into_values().collect();
        orders.sort_by_key(|o| (o.created(), o.id_typed()));
        Ok(filter.apply(orders))
    }

    async fn update(
        &mut self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let Some(current) = self.current(id)? else {
            return Ok(None);
        };
        let updated = update.apply_to(&current)?;
        self.staged.insert(id, Some(updated.clone()));
        Ok(Some(updated))
    }

    async fn delete(&mut self, id: OrderId) -> Result<bool, RepositoryError> {
        if self.current(id)?.is_none() {
            return Ok(false);
        }
        self.staged.insert(id, None);
        Ok(true)
    }
}

/// Unit of work over the in-memory store.
#[derive(Debug)]
pub struct InMemoryUnitOfWork {
    orders: InMemoryOrdersRepository,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    type Orders = InMemoryOrdersRepository;

    fn orders(&mut self) -> &mut Self::Orders {
        &mut self.orders
    }

    async fn commit(mut self) -> Result<(), RepositoryError> {
        let staged = std::mem::take(&mut self.orders.staged);
        let added = std::mem::take(&mut self.orders.added);
        let changes = staged.len();
        self.orders.store.apply(staged, &added)?;
        tracing::debug!(changes, "in-memory unit of work committed");
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), RepositoryError> {
        self.orders.staged.clear();
        self.orders.added.clear();
        Ok(())
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        if !self.orders.staged.is_empty() {
            tracing::debug!(
                changes = self.orders.staged.len(),
                "discarding uncommitted changes"
            );
        }
    }
}

/// Hands out units of work sharing one store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUnitOfWorkFactory {
    store: Arc<InMemoryOrderStore>,
}

impl InMemoryUnitOfWorkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Arc<InMemoryOrderStore> {
        &self.store
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUnitOfWorkFactory {
    type UnitOfWork = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, RepositoryError> {
        Ok(InMemoryUnitOfWork {
            orders: InMemoryOrdersRepository::new(self.store.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk_orders::{OrderItem, OrderStatus, Size};

    fn order() -> Order {
        Order::place(
            vec![OrderItem {
                product: "latte".into(),
                size: Size::Big,
                quantity: 2,
            }],
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn staged_writes_are_visible_inside_the_unit_of_work_only() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let o = order();

        let mut uow = factory.begin().await.unwrap();
        uow.orders().add(&o).await.unwrap();
        assert_eq!(uow.orders().get(o.id_typed()).await.unwrap(), Some(o.clone()));

        let mut other = factory.begin().await.unwrap();
        assert_eq!(other.orders().get(o.id_typed()).await.unwrap(), None);
        assert!(factory.store().is_empty().unwrap());
    }

    #[tokio::test]
    async fn commit_publishes_all_changes() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let a = order();
        let b = order();

        let mut uow = factory.begin().await.unwrap();
        uow.orders().add(&a).await.unwrap();
        uow.orders().add(&b).await.unwrap();
        uow.orders()
            .update(a.id_typed(), OrderUpdate::status(OrderStatus::Paid))
            .await
            .unwrap();
        assert_eq!(uow.orders().pending_changes(), 2);
        uow.commit().await.unwrap();

        assert_eq!(factory.store().len().unwrap(), 2);
        let mut reader = factory.begin().await.unwrap();
        let stored = reader.orders().get(a.id_typed()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Paid);
    }

    #[tokio::test]
    async fn dropping_without_commit_discards_changes() {
        let factory = InMemoryUnitOfWorkFactory::new();
        {
            let mut uow = factory.begin().await.unwrap();
            uow.orders().add(&order()).await.unwrap();
        }
        assert!(factory.store().is_empty().unwrap());
    }

    #[tokio::test]
    async fn explicit_rollback_discards_changes() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let mut uow = factory.begin().await.unwrap();
        uow.orders().add(&order()).await.unwrap();
        uow.rollback().await.unwrap();
        assert!(factory.store().is_empty().unwrap());
    }

    #[tokio::test]
    async fn staged_delete_hides_committed_order() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let o = order();

        let mut uow = factory.begin().await.unwrap();
        uow.orders().add(&o).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = factory.begin().await.unwrap();
        assert!(uow.orders().delete(o.id_typed()).await.unwrap());
        assert_eq!(uow.orders().get(o.id_typed()).await.unwrap(), None);
        assert!(uow.orders().list(&OrderFilter::default()).await.unwrap().is_empty());
        assert!(!uow.orders().delete(o.id_typed()).await.unwrap());
        drop(uow);

        assert_eq!(factory.store().len().unwrap(), 1);
    }

    #[tokio::test]
    async fn status_change_does_not_revive_a_concurrently_deleted_order() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let o = order();
        let mut uow = factory.begin().await.unwrap();
        uow.orders().add(&o).await.unwrap();
        uow.commit().await.unwrap();

        let mut payer = factory.begin().await.unwrap();
        payer
            .orders()
            .update(o.id_typed(), OrderUpdate::status(OrderStatus::Paid))
            .await
            .unwrap();

        let mut deleter = factory.begin().await.unwrap();
        assert!(deleter.orders().delete(o.id_typed()).await.unwrap());
        deleter.commit().await.unwrap();
        assert!(factory.store().is_empty().unwrap());

        payer.commit().await.unwrap();

        let mut reader = factory.begin().await.unwrap();
        assert_eq!(reader.orders().get(o.id_typed()).await.unwrap(), None);
        assert!(factory.store().is_empty().unwrap());
    }

    #[tokio::test]
    async fn order_added_and_updated_in_one_unit_of_work_is_committed() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let o = order();

        let mut uow = factory.begin().await.unwrap();
        uow.orders().add(&o).await.unwrap();
        uow.orders()
            .update(o.id_typed(), OrderUpdate::status(OrderStatus::Cancelled))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let mut reader = factory.begin().await.unwrap();
        let stored = reader.orders().get(o.id_typed()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn update_with_zero_quantity_is_an_invalid_update() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let o = order();
        let mut uow = factory.begin().await.unwrap();
        uow.orders().add(&o).await.unwrap();

        let err = uow
            .orders()
            .update(
                o.id_typed(),
                OrderUpdate::items(vec![OrderItem {
                    product: "latte".into(),
                    size: Size::Small,
                    quantity: 0,
                }]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidUpdate(_)));
        assert_eq!(uow.orders().get(o.id_typed()).await.unwrap(), Some(o));
    }

    #[test]
    fn poisoned_store_reports_an_error_instead_of_zero() {
        let store = Arc::new(InMemoryOrderStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(RepositoryError::Storage { .. })));
        assert!(store.is_empty().is_err());
    }

    #[tokio::test]
    async fn update_of_unknown_order_returns_none() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let mut uow = factory.begin().await.unwrap();
        let out = uow
            .orders()
            .update(OrderId::new(), OrderUpdate::status(OrderStatus::Cancelled))
            .await
            .unwrap();
        assert!(out.is_none());
        assert_eq!(uow.orders().pending_changes(), 0);
    }
}
