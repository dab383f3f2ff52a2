//! `wareflow-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every other crate
//! (identifiers, the domain error model, marker traits). No IO lives here.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, ProductId, SupplierId, WarehouseId};
pub use value_object::ValueObject;
