use core::str::FromStr;

use serde::{Deserialize, Serialize};

use orderdesk_core::{ValidationErrors, ValueObject};

/// Largest accepted quantity (fits a signed 32-bit column).
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Product size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    Medium,
    Big,
}

impl Size {
    pub const ALL: [Size; 3] = [Size::Small, Size::Medium, Size::Big];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Big => "big",
        }
    }
}

impl core::fmt::Display for Size {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Size::Small),
            "medium" => Ok(Size::Medium),
            "big" => Ok(Size::Big),
            other => Err(format!(
                "'{other}' is not a valid size; expected one of: small, medium, big"
            )),
        }
    }
}

/// A validated order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: String,
    pub size: Size,
    /// Always in `1..=MAX_QUANTITY`.
    pub quantity: u32,
}

impl ValueObject for OrderItem {}

/// An order line as received from a client, before validation.
///
/// `size` is still free text and `quantity` a signed integer; defaults (a
/// missing quantity means 1) are resolved by whoever builds the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemDraft {
    pub product: String,
    pub size: String,
    pub quantity: i64,
}

impl OrderItemDraft {
    pub fn new(product: impl Into<String>, size: impl Into<String>, quantity: i64) -> Self {
        Self {
            product: product.into(),
            size: size.into(),
            quantity,
        }
    }

    /// Validate a single draft, recording violations under `loc`.
    fn validate_into(self, loc: &str, errors: &mut ValidationErrors) -> Option<OrderItem> {
        let size = match self.size.parse::<Size>() {
            Ok(size) => Some(size),
            Err(msg) => {
                errors.push(format!("{loc}.size"), msg);
                None
            }
        };

        let quantity = if self.quantity < 1 {
            errors.push(format!("{loc}.quantity"), "must be greater than or equal to 1");
            None
        } else if self.quantity > i64::from(MAX_QUANTITY) {
            errors.push(
                format!("{loc}.quantity"),
                format!("must be less than or equal to {MAX_QUANTITY}"),
            );
            None
        } else {
            u32::try_from(self.quantity).ok()
        };

        Some(OrderItem {
            product: self.product,
            size: size?,
            quantity: quantity?,
        })
    }
}

/// Turn raw drafts into order items.
///
/// Fails when the list is empty or when any draft breaks a field constraint;
/// the error lists every violation found, addressed as `order.<index>.<field>`.
pub fn validate_items(drafts: Vec<OrderItemDraft>) -> Result<Vec<OrderItem>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if drafts.is_empty() {
        errors.push("order", "must contain at least one item");
    }

    let mut items = Vec::with_capacity(drafts.len());
    for (idx, draft) in drafts.into_iter().enumerate() {
        if let Some(item) = draft.validate_into(&format!("order.{idx}"), &mut errors) {
            items.push(item);
        }
    }

    errors.into_result(items)
}
