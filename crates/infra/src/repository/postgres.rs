//! Postgres-backed orders repository.
//!
//! Every unit of work owns one `sqlx::Transaction`; all repository
//! statements run on it. `commit` commits the transaction. Dropping the unit
//! of work without committing lets sqlx roll the transaction back.
//!
//! ## Schema
//!
//! ```text
//! orders      (id UUID PK, created TIMESTAMPTZ, status TEXT)
//! order_items (order_id UUID FK -> orders ON DELETE CASCADE, position INT,
//!              product TEXT, size TEXT, quantity INT, PK (order_id, position))
//! ```
//!
//! ## Error Mapping
//!
//! | SQLx Error | RepositoryError |
//! |------------|-----------------|
//! | Database (any code) | `Storage` with the database message and code |
//! | PoolTimedOut / PoolClosed / Io / other | `Storage` |
//! | Undecodable row / broken invariant | `Corrupt` |

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use orderdesk_core::OrderId;
use orderdesk_orders::{Order, OrderItem, OrderStatus, Size};

use super::{OrderFilter, OrderUpdate, OrdersRepository, RepositoryError};
use crate::config::PostgresConfig;
use crate::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id      UUID PRIMARY KEY,
        created TIMESTAMPTZ NOT NULL,
        status  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        order_id UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        product  TEXT NOT NULL,
        size     TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity >= 1),
        PRIMARY KEY (order_id, position)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_created_idx ON orders (created, id)",
];

/// Create the orders tables if they do not exist yet.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    for statement in SCHEMA {
        sqlx::query(*statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

/// Orders repository bound to one database transaction.
pub struct PostgresOrdersRepository {
    tx: Transaction<'static, Postgres>,
}

impl PostgresOrdersRepository {
    async fn insert_items(&mut self, id: OrderId, items: &[OrderItem]) -> Result<(), RepositoryError> {
        for (position, item) in items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| RepositoryError::corrupt(id, "too many items"))?;
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| RepositoryError::corrupt(id, "quantity out of range"))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product, size, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id.as_uuid())
            .bind(position)
            .bind(&item.product)
            .bind(item.size.as_str())
            .bind(quantity)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }
        Ok(())
    }

    async fn load_items(
        &mut self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<OrderItem>>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product, size, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("load_order_items", e))?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let (order_id, item) = item_from_row(&row)?;
            items.entry(order_id).or_default().push(item);
        }
        Ok(items)
    }

    async fn assemble(&mut self, rows: Vec<PgRow>) -> Result<Vec<Order>, RepositoryError> {
        let heads = rows
            .iter()
            .map(order_head_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<Uuid> = heads.iter().map(|h| *h.id.as_uuid()).collect();
        let mut items = self.load_items(&ids).await?;

        heads
            .into_iter()
            .map(|head| {
                let order_items = items.remove(head.id.as_uuid()).unwrap_or_default();
                Order::restore(head.id, order_items, head.created, head.status)
                    .map_err(|e| RepositoryError::corrupt(head.id, e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl OrdersRepository for PostgresOrdersRepository {
    #[instrument(skip(self, order), fields(order_id = %order.id_typed()), err)]
    async fn add(&mut self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO orders (id, created, status) VALUES ($1, $2, $3)")
            .bind(order.id_typed().as_uuid())
            .bind(order.created())
            .bind(order.status().as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;

        self.insert_items(order.id_typed(), order.items()).await
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query("SELECT id, created, status FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let limit = filter.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let rows = sqlx::query(
            r#"
            SELECT id, created, status
            FROM orders
            WHERE ($1::BOOLEAN IS NULL OR (status = 'cancelled') = $1)
            ORDER BY created, id
            LIMIT $2
            "#,
        )
        .bind(filter.cancelled)
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        self.assemble(rows).await
    }

    #[instrument(skip(self, update), fields(order_id = %id), err)]
    async fn update(
        &mut self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };
        let replace_items = update.items.is_some();
        let updated = update.apply_to(&current)?;

        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(updated.status().as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;
        // Deleted by a transaction that committed after our read.
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if replace_items {
            sqlx::query("DELETE FROM order_items WHERE order_id = $1")
                .bind(id.as_uuid())
                .execute(&mut *self.tx)
                .await
                .map_err(|e| map_sqlx_error("clear_order_items", e))?;
            self.insert_items(id, updated.items()).await?;
        }

        Ok(Some(updated))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn delete(&mut self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Unit of work backed by a Postgres transaction.
pub struct PostgresUnitOfWork {
    orders: PostgresOrdersRepository,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Orders = PostgresOrdersRepository;

    fn orders(&mut self) -> &mut Self::Orders {
        &mut self.orders
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.orders
            .tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self) -> Result<(), RepositoryError> {
        self.orders
            .tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

/// Opens one transaction per unit of work on a shared pool.
#[derive(Debug, Clone)]
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool and make sure the schema exists.
    #[instrument(skip(config), fields(max_connections = config.max_connections), err)]
    pub async fn connect(config: &PostgresConfig) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        ensure_schema(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    type UnitOfWork = PostgresUnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresUnitOfWork {
            orders: PostgresOrdersRepository { tx },
        })
    }
}

struct OrderHead {
    id: OrderId,
    created: DateTime<Utc>,
    status: OrderStatus,
}

fn order_head_from_row(row: &PgRow) -> Result<OrderHead, RepositoryError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("decode_order", e))?;
    let id = OrderId::from_uuid(id);
    let created: DateTime<Utc> = row
        .try_get("created")
        .map_err(|e| RepositoryError::corrupt(id, e.to_string()))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| RepositoryError::corrupt(id, e.to_string()))?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| RepositoryError::corrupt(id, e))?;

    Ok(OrderHead {
        id,
        created,
        status,
    })
}

fn item_from_row(row: &PgRow) -> Result<(Uuid, OrderItem), RepositoryError> {
    let order_id: Uuid = row
        .try_get("order_id")
        .map_err(|e| map_sqlx_error("decode_order_item", e))?;
    let id = OrderId::from_uuid(order_id);

    let product: String = row
        .try_get("product")
        .map_err(|e| RepositoryError::corrupt(id, e.to_string()))?;
    let size: String = row
        .try_get("size")
        .map_err(|e| RepositoryError::corrupt(id, e.to_string()))?;
    let size = size
        .parse::<Size>()
        .map_err(|e| RepositoryError::corrupt(id, e))?;
    let quantity: i32 = row
        .try_get("quantity")
        .map_err(|e| RepositoryError::corrupt(id, e.to_string()))?;
    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| RepositoryError::corrupt(id, format!("invalid quantity {quantity}")))?;

    Ok((
        order_id,
        OrderItem {
            product,
            size,
            quantity,
        },
    ))
}

/// Map SQLx errors to repository errors.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err
                .code()
                .map(|c| c.into_owned())
                .unwrap_or_else(|| "unknown".to_string());
            RepositoryError::storage(
                operation,
                format!("database error [{code}]: {}", db_err.message()),
            )
        }
        sqlx::Error::PoolTimedOut => {
            RepositoryError::storage(operation, "connection pool timed out")
        }
        sqlx::Error::PoolClosed => RepositoryError::storage(operation, "connection pool closed"),
        other => RepositoryError::storage(operation, other.to_string()),
    }
}
