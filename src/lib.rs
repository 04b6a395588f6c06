//! Samyama SGraph
//!
//! A single-machine graph structure over columnar attribute tables, with
//! lazily composed structural operations, attribute overlay views and
//! parallel vertex-edge-vertex computation.
//!
//! # Architecture
//!
//! - `table`: typed in-memory columnar tables holding vertex and edge attributes
//! - `graph`: the structurally immutable graph, its lazy operation DAG,
//!   adjacency index, overlay views and selection queries
//! - `compute`: triple-apply, the parallel per-edge transform engine
//! - `toolkit`: degree count, PageRank and connected components on triple-apply
//! - `persistence`: compressed whole-graph snapshots
//!
//! ## Example Usage
//!
//! ```rust
//! use samyama_sgraph::{Column, Graph, Table, Value};
//!
//! let edges = Table::from_columns(vec![
//!     ("src", Column::Int(vec![Some(1), Some(2)])),
//!     ("dst", Column::Int(vec![Some(2), Some(1)])),
//! ])
//! .unwrap();
//! let graph = Graph::construct(Table::new(), edges, "id", "src", "dst").unwrap();
//!
//! // Structural operations return new graphs
//! let more = graph.add_edges(
//!     Table::from_columns(vec![
//!         ("src", Column::Int(vec![Some(1)])),
//!         ("dst", Column::Int(vec![Some(3)])),
//!     ])
//!     .unwrap(),
//!     "src",
//!     "dst",
//! )
//! .unwrap();
//! assert_eq!(graph.edge_count().unwrap(), 2);
//! assert_eq!(more.edge_count().unwrap(), 3);
//!
//! // Attribute edits go through an overlay view on one instance
//! more.vertices().add_column("visits", Value::from(0)).unwrap();
//!
//! // Count in-edges in parallel
//! let counted = more
//!     .triple_apply(
//!         |t| {
//!             let visits = t.target.get_integer("visits").unwrap_or(0);
//!             t.target.set("visits", visits + 1);
//!             Ok(())
//!         },
//!         &["visits"],
//!     )
//!     .unwrap();
//! let vertex = counted.get_vertices(&[Value::from(1)], &[]).unwrap();
//! assert_eq!(vertex.value(0, "visits"), Some(Value::from(1)));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod compute;
pub mod graph;
pub mod persistence;
pub mod table;
pub mod toolkit;

// Re-export main types for convenience
pub use graph::{
    AttributeView, EdgeSpec, ElementKind, Graph, GraphError, GraphResult, GraphSchema,
    GraphSummary, Selector, DST_COLUMN, SRC_COLUMN, VID_COLUMN, WILDCARD,
};

pub use table::{Aggregate, Column, ColumnExpr, ColumnType, Row, Table, TableError, Value};

pub use compute::{lock_order, Record, Triple, TripleApplyConfig};

pub use toolkit::{
    connected_components, degree_count, pagerank, PageRankConfig, Params, ToolkitRegistry,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
