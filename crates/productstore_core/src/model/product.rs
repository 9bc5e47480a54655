//! Product entity.
//!
//! # Invariants
//! - `id` is assigned by the store on insert and never changes afterwards.
//! - `id == 0` means "not yet persisted".

use serde::{Deserialize, Serialize};

/// Store-assigned product identity.
pub type ProductId = i64;

/// Identity value of a product that has not been inserted yet.
pub const UNSAVED_PRODUCT_ID: ProductId = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Missing in request bodies for new products.
    #[serde(default)]
    pub id: ProductId,
    pub name: String,
    pub price: f64,
}

impl Product {
    /// Creates an unsaved product; the store assigns `id` on insert.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self::with_id(UNSAVED_PRODUCT_ID, name, price)
    }

    pub fn with_id(id: ProductId, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_PRODUCT_ID
    }
}
