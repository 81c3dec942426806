//! atelier-table: client-side tabular query engine for the Atelier dashboard.
//!
//! Given a slice of records and a list of column descriptors, a
//! [`DataTable`] derives the rows to display: active filters narrow the
//! input, the search term narrows it further, and the sort orders what is
//! left. The derivation is a pure function of the records, the columns and
//! the table's [`TableState`]; records are borrowed, never copied or mutated.
//!
//! # Pipeline
//!
//! ```text
//! records ──► filters (AND, exact match on string form)
//!         ──► search  (raw value OR displayed text, case-insensitive)
//!         ──► sort    (stable, total order over CellValue)
//!         ──► TableView { rows: Vec<&R>, filters, active_filters, sort }
//! ```
//!
//! Records implement [`Record`] to resolve dotted paths such as
//! `"metadata.name"`. `serde_json::Value` implements it directly; typed
//! payloads are wrapped in a [`Snapshot`].

pub mod column;
pub mod engine;
pub mod error;
pub mod path;
pub mod record;
pub mod state;
pub mod value;

pub use column::{Cell, Column};
pub use engine::{ActiveFilter, DataTable, FilterControl, TableView, DEFAULT_SEARCH_PLACEHOLDER};
pub use error::TableError;
pub use path::FieldPath;
pub use record::{Record, Snapshot};
pub use state::{SortDirection, SortState, TableState};
pub use value::CellValue;
