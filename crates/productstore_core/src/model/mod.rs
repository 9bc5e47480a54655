//! Entity model for the product store.
//!
//! # Responsibility
//! - Define plain data records persisted by repositories.
//!
//! # Invariants
//! - Entities carry no persistence behavior; SQL lives in `repo`.

pub mod product;
