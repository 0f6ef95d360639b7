use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use orderdesk_infra::UnitOfWorkFactory;

pub mod orders;
pub mod system;

/// Router for all endpoints; `/orders` answers with and without the trailing slash.
pub fn router<F: UnitOfWorkFactory>() -> Router<Arc<F>> {
    Router::new()
        .route("/health", get(system::health))
        .route(
            "/orders",
            get(orders::list_orders::<F>).post(orders::create_order::<F>),
        )
        .route(
            "/orders/",
            get(orders::list_orders::<F>).post(orders::create_order::<F>),
        )
        .route(
            "/orders/:order_id",
            get(orders::get_order::<F>)
                .put(orders::update_order::<F>)
                .delete(orders::delete_order::<F>),
        )
        .route("/orders/:order_id/cancel", post(orders::cancel_order::<F>))
        .route("/orders/:order_id/pay", post(orders::pay_order::<F>))
}
