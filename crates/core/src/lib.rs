//! `orderdesk-core`: shared building blocks for the orders domain.
//!
//! Pure types only: identifiers, structured validation errors and the
//! entity/value-object markers. No IO, no HTTP, no storage.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{FieldViolation, InvalidId, ValidationErrors};
pub use id::OrderId;
pub use value_object::ValueObject;
