//! Product repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and lookup APIs over the `products` table.
//! - Keep product SQL inside the core persistence boundary.
//!
//! # Invariants
//! - Every statement runs through the transaction-bound `SqlExecutor`.
//! - Insert ignores the incoming `id`; the store assigns it.

use crate::error::{CardinalityError, DataAccessError, DataResult};
use crate::model::product::{Product, ProductId};
use crate::repo::executor::{Command, FromRow, SqlExecutor};
use crate::repo::Repository;
use rusqlite::types::Value;
use rusqlite::Row;

const PRODUCT_SELECT_SQL: &str = "SELECT id, name, price FROM products";

/// Product-specific lookups on top of the generic repository contract.
pub trait ProductRepository: Repository<Product, ProductId> {
    /// Product with exactly this name, if any.
    ///
    /// Several products sharing the name is a cardinality error.
    fn find_by_name(&self, name: &str) -> DataResult<Option<Product>>;
}

/// SQLite-backed product repository bound to one transaction.
#[derive(Debug)]
pub struct SqliteProductRepository {
    executor: SqlExecutor,
}

impl SqliteProductRepository {
    pub fn new(executor: SqlExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &SqlExecutor {
        &self.executor
    }
}

impl Repository<Product, ProductId> for SqliteProductRepository {
    fn get_all(&self) -> DataResult<Vec<Product>> {
        self.executor
            .query(&Command::new(format!("{PRODUCT_SELECT_SQL} ORDER BY id ASC;")))
    }

    fn get_by_id(&self, key: ProductId) -> DataResult<Option<Product>> {
        self.executor.query_optional(
            &Command::new(format!("{PRODUCT_SELECT_SQL} WHERE id = :id;")).param("id", key),
        )
    }

    fn add(&self, entity: &Product) -> DataResult<ProductId> {
        let id = self.executor.execute_scalar::<ProductId>(
            &Command::new(
                "INSERT INTO products (name, price)
                 VALUES (:name, :price)
                 RETURNING id;",
            )
            .param("name", Value::Text(entity.name.clone()))
            .param("price", entity.price),
        )?;
        id.ok_or(DataAccessError::Cardinality(CardinalityError::NoRows))
    }

    fn update(&self, entity: &Product) -> DataResult<bool> {
        let changed = self.executor.execute(
            &Command::new(
                "UPDATE products
                 SET name = :name,
                     price = :price
                 WHERE id = :id;",
            )
            .param("id", entity.id)
            .param("name", Value::Text(entity.name.clone()))
            .param("price", entity.price),
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, key: ProductId) -> DataResult<bool> {
        let changed = self
            .executor
            .execute(&Command::new("DELETE FROM products WHERE id = :id;").param("id", key))?;
        Ok(changed > 0)
    }
}

impl ProductRepository for SqliteProductRepository {
    fn find_by_name(&self, name: &str) -> DataResult<Option<Product>> {
        self.executor.query_optional(
            &Command::new(format!("{PRODUCT_SELECT_SQL} WHERE name = :name;"))
                .param("name", Value::Text(name.to_string())),
        )
    }
}

impl FromRow for Product {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get("id")?,
            name: row.get("name")?,
            price: row.get("price")?,
        })
    }
}
