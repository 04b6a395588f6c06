//! Error taxonomy for graph operations

use crate::table::TableError;
use thiserror::Error;

/// Errors that can occur during graph operations
///
/// Schema problems detectable from column metadata are reported by the call
/// that introduces them. Problems inside lazily composed work (a failing
/// column expression or filter predicate) surface only when the graph is
/// materialized, which may be far from where the operation was declared.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("{operation}: '{column}' is a structural column and cannot be modified")]
    ReservedColumn { operation: String, column: String },

    #[error("{operation}: no such column '{column}'")]
    NoSuchColumn { operation: String, column: String },

    #[error("triple_apply: field '{field}' was written but not declared as mutated")]
    UndeclaredMutation { field: String },

    #[error("Compute error: {0}")]
    Compute(String),

    #[error("The graph behind this view has been dropped")]
    GraphDropped,

    #[error("Unknown toolkit: {0}")]
    UnknownToolkit(String),

    #[error("Invalid argument for {toolkit}: {message}")]
    InvalidArgument { toolkit: String, message: String },

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl GraphError {
    pub(crate) fn reserved(operation: &str, column: &str) -> Self {
        GraphError::ReservedColumn {
            operation: operation.to_string(),
            column: column.to_string(),
        }
    }

    pub(crate) fn no_such_column(operation: &str, column: &str) -> Self {
        GraphError::NoSuchColumn {
            operation: operation.to_string(),
            column: column.to_string(),
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
