use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::OrderId;
use orderdesk_orders::{Order, OrderItem, OrderItemDraft, OrderStatus};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /orders` and `PUT /orders/{id}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub order: Vec<OrderItemRequest>,
}

/// One line of a create/update request.
///
/// `size` stays text here so an unknown size is reported together with the
/// other field violations. `quantity` may be omitted (defaults to 1) but not
/// sent as `null`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderItemRequest {
    pub product: String,
    pub size: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

impl CreateOrderRequest {
    pub fn into_drafts(self) -> Vec<OrderItemDraft> {
        self.order
            .into_iter()
            .map(|item| OrderItemDraft::new(item.product, item.size, item.quantity))
            .collect()
    }
}

/// Query string of `GET /orders`.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub cancelled: Option<bool>,
    pub limit: Option<usize>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub created: DateTime<Utc>,
    pub status: OrderStatus,
    pub order: Vec<OrderItem>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id_typed(),
            created: order.created(),
            status: order.status(),
            order: order.items().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
}

impl ListOrdersResponse {
    pub fn from_orders(orders: &[Order]) -> Self {
        Self {
            orders: orders.iter().map(OrderResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_quantity_defaults_to_one() {
        let req: CreateOrderRequest = serde_json::from_value(json!({
            "order": [{"product": "latte", "size": "small"}]
        }))
        .unwrap();
        assert_eq!(req.into_drafts(), vec![OrderItemDraft::new("latte", "small", 1)]);
    }

    #[test]
    fn null_quantity_is_rejected() {
        let res = serde_json::from_value::<CreateOrderRequest>(json!({
            "order": [{"product": "latte", "size": "small", "quantity": null}]
        }));
        assert!(res.is_err());
    }

    #[test]
    fn unknown_fields_are_rejected_at_both_levels() {
        let item_level = serde_json::from_value::<CreateOrderRequest>(json!({
            "order": [{"product": "latte", "size": "small", "milk": "oat"}]
        }));
        assert!(item_level.is_err());

        let top_level = serde_json::from_value::<CreateOrderRequest>(json!({
            "order": [{"product": "latte", "size": "small"}],
            "status": "paid"
        }));
        assert!(top_level.is_err());
    }

    #[test]
    fn order_response_shape() {
        let order = Order::place(
            vec![OrderItem {
                product: "A".into(),
                size: orderdesk_orders::Size::Small,
                quantity: 2,
            }],
            Utc::now(),
        )
        .unwrap();

        let body = serde_json::to_value(OrderResponse::from(&order)).unwrap();
        assert_eq!(body["id"], order.id_typed().to_string());
        assert_eq!(body["status"], "created");
        assert_eq!(body["order"], json!([{"product": "A", "size": "small", "quantity": 2}]));
        assert!(body["created"].as_str().is_some());
    }
}
