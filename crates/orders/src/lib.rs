//! Orders domain module.
//!
//! Business rules for orders and their line items, implemented as plain
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;
pub mod order;

pub use item::{MAX_QUANTITY, OrderItem, OrderItemDraft, Size, validate_items};
pub use order::{Order, OrderStatus, Transition};
