//! In-memory columnar attribute tables
//!
//! Vertex and edge attributes of a graph are each held in one `Table`:
//! typed, nullable columns addressed by name, with filtering, projection,
//! concatenation, joins and group-by aggregation. Every read-returning
//! operation yields detached storage.

pub mod column;
pub mod expr;
pub mod frame;
pub mod ops;
pub mod value;

pub use column::{Column, ColumnType};
pub use expr::{ColumnExpr, RowFn, RowPredicate};
pub use frame::{Row, Table, TableError, TableResult};
pub use ops::Aggregate;
pub use value::{Value, ValueKey};
