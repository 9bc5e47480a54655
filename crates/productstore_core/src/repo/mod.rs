//! Repository contracts, the statement executor and SQLite implementations.
//!
//! # Responsibility
//! - Define the generic entity repository contract.
//! - Isolate SQL text and row mapping from unit-of-work orchestration.
//!
//! # Invariants
//! - "Not found" is a value (`None` / `false`), never an error.
//! - Only integrity violations and driver failures surface as errors.

pub mod executor;
pub mod grid;
pub mod product_repo;

use crate::error::DataResult;

/// CRUD contract over an entity type `E` keyed by `K`.
pub trait Repository<E, K> {
    /// Every stored entity. An empty store yields an empty vector.
    fn get_all(&self) -> DataResult<Vec<E>>;

    /// The entity stored under `key`, if any.
    fn get_by_id(&self, key: K) -> DataResult<Option<E>>;

    /// Inserts `entity` and returns the store-assigned key.
    ///
    /// The key carried by `entity` is ignored.
    fn add(&self, entity: &E) -> DataResult<K>;

    /// Updates the stored entity with `entity`'s key; `false` when none matched.
    fn update(&self, entity: &E) -> DataResult<bool>;

    /// Deletes the entity stored under `key`; `false` when none matched.
    fn delete(&self, key: K) -> DataResult<bool>;
}
