//! Product endpoints: list, get, add, update, delete.
//!
//! # Invariants
//! - Mutations are committed only after the repository call succeeded.
//! - A commit that was rolled back is reported as `Failure`, never as success.

use super::ActionResult;
use crate::error::DataResult;
use crate::model::product::{Product, ProductId};
use crate::repo::Repository;
use crate::uow::{CommitOutcome, UnitOfWork};
use log::warn;

/// Use-case adapter for product requests over one unit of work.
pub struct ProductController<U: UnitOfWork> {
    uow: U,
}

impl<U: UnitOfWork> ProductController<U> {
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    pub fn unit_of_work(&mut self) -> &mut U {
        &mut self.uow
    }

    pub fn into_inner(self) -> U {
        self.uow
    }

    pub fn get_all(&mut self) -> ActionResult<Vec<Product>> {
        into_action("get_all", self.uow.products().and_then(|repo| repo.get_all()))
    }

    pub fn get_by_id(&mut self, id: ProductId) -> ActionResult<Product> {
        match self.uow.products().and_then(|repo| repo.get_by_id(id)) {
            Ok(Some(product)) => ActionResult::Ok(product),
            Ok(None) => ActionResult::NotFound,
            Err(err) => failure("get_by_id", err),
        }
    }

    pub fn add(&mut self, product: &Product) -> ActionResult<ProductId> {
        let added = self.uow.products().and_then(|repo| repo.add(product));
        match added {
            Ok(id) => self.commit_then("add", ActionResult::Ok(id)),
            Err(err) => failure("add", err),
        }
    }

    /// Updates product `id`; the body's id must match the route id.
    pub fn update(&mut self, id: ProductId, product: &Product) -> ActionResult<()> {
        if id != product.id {
            return ActionResult::BadRequest(format!(
                "route id {id} does not match body id {}",
                product.id
            ));
        }
        match self.uow.products().and_then(|repo| repo.update(product)) {
            Ok(true) => self.commit_then("update", ActionResult::NoContent),
            Ok(false) => ActionResult::NotFound,
            Err(err) => failure("update", err),
        }
    }

    pub fn delete(&mut self, id: ProductId) -> ActionResult<()> {
        match self.uow.products().and_then(|repo| repo.delete(id)) {
            Ok(true) => self.commit_then("delete", ActionResult::NoContent),
            Ok(false) => ActionResult::NotFound,
            Err(err) => failure("delete", err),
        }
    }

    fn commit_then<T>(&mut self, action: &'static str, success: ActionResult<T>) -> ActionResult<T> {
        match self.uow.commit() {
            Ok(CommitOutcome::Committed) => success,
            Ok(CommitOutcome::RolledBack(cause)) => failure(action, cause),
            Err(err) => failure(action, err),
        }
    }
}

fn into_action<T>(action: &'static str, result: DataResult<T>) -> ActionResult<T> {
    match result {
        Ok(value) => ActionResult::Ok(value),
        Err(err) => failure(action, err),
    }
}

fn failure<T>(action: &'static str, err: impl std::fmt::Display) -> ActionResult<T> {
    warn!("event=controller_action module=controller status=error action={action} error={err}");
    ActionResult::Failure(format!("{action} failed: {err}"))
}
