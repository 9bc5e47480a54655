//! Transport-agnostic request adapters over a unit of work.
//!
//! # Responsibility
//! - Translate use-case calls into repository calls and commits.
//! - Map results onto REST-style action results with status codes.
//!
//! # Invariants
//! - Data-access errors never escape a controller; they become `Failure`.

pub mod product_controller;

use serde::Serialize;

/// Outcome of a controller action, mirroring REST status semantics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "body", rename_all = "snake_case")]
pub enum ActionResult<T> {
    Ok(T),
    NoContent,
    BadRequest(String),
    NotFound,
    Failure(String),
}

impl<T> ActionResult<T> {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Ok(_) => 200,
            Self::NoContent => 204,
            Self::BadRequest(_) => 400,
            Self::NotFound => 404,
            Self::Failure(_) => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_) | Self::NoContent)
    }

    pub fn body(&self) -> Option<&T> {
        match self {
            Self::Ok(body) => Some(body),
            _ => None,
        }
    }
}
