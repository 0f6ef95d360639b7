use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{Entity, OrderId, ValidationErrors};

use crate::item::{MAX_QUANTITY, OrderItem};

/// Order status lifecycle.
///
/// Forward path: `created → paid → progress → dispatched → delivered`.
/// `cancelled` branches off any state that is not already terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Paid,
    Progress,
    Cancelled,
    Dispatched,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Created,
        OrderStatus::Paid,
        OrderStatus::Progress,
        OrderStatus::Cancelled,
        OrderStatus::Dispatched,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Paid => "paid",
            OrderStatus::Progress => "progress",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Next state on the forward path, `None` for terminal states.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Created => Some(OrderStatus::Paid),
            OrderStatus::Paid => Some(OrderStatus::Progress),
            OrderStatus::Progress => Some(OrderStatus::Dispatched),
            OrderStatus::Dispatched => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            OrderStatus::Delivered | OrderStatus::Cancelled => true,
            OrderStatus::Created
            | OrderStatus::Paid
            | OrderStatus::Progress
            | OrderStatus::Dispatched => false,
        }
    }

    /// Whether moving to `target` is a step the lifecycle describes.
    pub fn follows_lifecycle(&self, target: OrderStatus) -> bool {
        match target {
            OrderStatus::Cancelled => !self.is_terminal(),
            OrderStatus::Created => false,
            OrderStatus::Paid
            | OrderStatus::Progress
            | OrderStatus::Dispatched
            | OrderStatus::Delivered => self.next() == Some(target),
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{s}'"))
    }
}

/// Outcome of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// `false` when the change skipped or reversed the lifecycle (it is
    /// still applied).
    pub follows_lifecycle: bool,
}

/// Order aggregate: line items plus lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    items: Vec<OrderItem>,
    created: DateTime<Utc>,
    status: OrderStatus,
}

impl Order {
    /// Place a new order: fresh id, status `created`, created at `now`.
    pub fn place(items: Vec<OrderItem>, now: DateTime<Utc>) -> Result<Self, ValidationErrors> {
        ensure_items(&items)?;
        Ok(Self {
            id: OrderId::new(),
            items,
            created: now,
            status: OrderStatus::Created,
        })
    }

    /// Rebuild an order from stored state.
    pub fn restore(
        id: OrderId,
        items: Vec<OrderItem>,
        created: DateTime<Utc>,
        status: OrderStatus,
    ) -> Result<Self, ValidationErrors> {
        ensure_items(&items)?;
        Ok(Self {
            id,
            items,
            created,
            status,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    /// Replace the whole item list. Id, status and creation time are kept.
    pub fn replace_items(&mut self, items: Vec<OrderItem>) -> Result<(), ValidationErrors> {
        ensure_items(&items)?;
        self.items = items;
        Ok(())
    }

    pub fn cancel(&mut self) -> Transition {
        self.transition_to(OrderStatus::Cancelled)
    }

    pub fn pay(&mut self) -> Transition {
        self.transition_to(OrderStatus::Paid)
    }

    fn transition_to(&mut self, target: OrderStatus) -> Transition {
        let from = self.status;
        self.status = target;
        Transition {
            from,
            to: target,
            follows_lifecycle: from.follows_lifecycle(target),
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Invariants every stored order keeps, whatever built its items.
fn ensure_items(items: &[OrderItem]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if items.is_empty() {
        errors.push("order", "must contain at least one item");
    }
    for (idx, item) in items.iter().enumerate() {
        if item.quantity < 1 {
            errors.push(
                format!("order.{idx}.quantity"),
                "must be greater than or equal to 1",
            );
        } else if item.quantity > MAX_QUANTITY {
            errors.push(
                format!("order.{idx}.quantity"),
                format!("must be less than or equal to {MAX_QUANTITY}"),
            );
        }
    }
    errors.into_result(())
}
