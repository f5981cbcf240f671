//! Error types
//!
//! Failures that surface to callers of the crate. Requisite loaders never
//! produce these for the evaluator: their errors are swallowed inside the
//! resolution engine and only show up in logs and events.

use std::io;

use thiserror::Error;

/// Error type for catalog construction, inventory lookups and persistence.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("tag '{0}' is declared more than once")]
    DuplicateTag(String),
    #[error("unknown tag '{0}'")]
    UnknownTag(String),
    #[error("package '{0}' is not in the inventory")]
    UnknownPackage(String),
    #[error("requisite '{requisite}' did not finish within {timeout_ms} ms")]
    LoadTimeout { requisite: String, timeout_ms: u64 },
    #[error("inventory error: {0}")]
    Inventory(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type TagResult<T> = Result<T, TagError>;
