//! Error types for the table engine.
//!
//! Deriving a view never fails; these cover table construction and parsing
//! of user-supplied state.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate column key: {0}")]
    DuplicateColumn(String),

    #[error("invalid sort direction: {0:?} (expected \"asc\" or \"desc\")")]
    InvalidDirection(String),
}
