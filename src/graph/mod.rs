//! Structurally immutable graph over columnar attribute tables
//!
//! This module implements the graph data model with:
//! - A vertex table keyed by `__id` and an edge table keyed by `__src_id`/`__dst_id`
//! - Directed multigraph semantics: duplicate (source, target) pairs are distinct edges
//! - Lazy composition of structural operations, materialized once per node
//! - Attribute overlay views bound to one graph instance
//! - Point, wildcard and field-equality selection

pub mod error;
pub mod index;
pub(crate) mod lazy;
pub mod schema;
pub mod selection;
pub mod store;
pub mod view;

// Re-export main types
pub use error::{GraphError, GraphResult};
pub use index::{GraphData, VertexIndex};
pub use schema::{ElementKind, GraphSchema};
pub use selection::{EdgeSpec, Selector, WILDCARD};
pub use store::{Graph, GraphSummary};
pub use view::AttributeView;

/// Reserved vertex identity column
pub const VID_COLUMN: &str = "__id";
/// Reserved edge source column
pub const SRC_COLUMN: &str = "__src_id";
/// Reserved edge target column
pub const DST_COLUMN: &str = "__dst_id";

pub const RESERVED_COLUMNS: [&str; 3] = [VID_COLUMN, SRC_COLUMN, DST_COLUMN];

/// Whether `name` is one of the structural columns
pub fn is_reserved(name: &str) -> bool {
    RESERVED_COLUMNS.contains(&name)
}
