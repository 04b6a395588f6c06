//! Graph handle and structural operations
//!
//! A [`Graph`] owns a shared handle pointing at the current node of the lazy
//! operation DAG. Structural operations return new graphs whose node has the
//! old one as parent; attribute mutation swaps the node behind this handle
//! only, so two graph instances never observe each other's edits.

use super::error::{GraphError, GraphResult};
use super::index::GraphData;
use super::lazy::{GraphNode, GraphOp};
use super::schema::{ElementKind, GraphSchema};
use super::{is_reserved, DST_COLUMN, RESERVED_COLUMNS, SRC_COLUMN, VID_COLUMN};
use crate::table::{ColumnExpr, Row, Table};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Vertex and edge counts of a materialized graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub num_vertices: usize,
    pub num_edges: usize,
}

/// Shared, swappable pointer to the current DAG node of one graph instance
#[derive(Debug)]
pub(crate) struct GraphHandle {
    node: RwLock<Arc<GraphNode>>,
}

impl GraphHandle {
    pub(crate) fn node(&self) -> Arc<GraphNode> {
        Arc::clone(&self.node.read())
    }

    /// Replace the current node with one derived from it.
    ///
    /// A materialized current node is first collapsed into a fresh base over
    /// its cached data, so repeated edit-then-read cycles keep one cached copy
    /// instead of a chain of them.
    ///
    /// Single writer: concurrent attribute mutation of the same instance from
    /// several callers is not supported.
    fn update<F>(&self, derive: F) -> GraphResult<()>
    where
        F: FnOnce(&Arc<GraphNode>) -> GraphResult<Arc<GraphNode>>,
    {
        let mut current = self.node.write();
        let from = match current.cached() {
            Some(data) if current.parent().is_some() => GraphNode::base_shared(data, current.schema().clone()),
            _ => Arc::clone(&*current),
        };
        let next = derive(&from)?;
        debug!("Graph node {} replaced by {}", current.id(), next.id());
        *current = next;
        Ok(())
    }
}

/// Immutable-structure graph over vertex and edge attribute tables
///
/// Structural columns: `__id` on vertices, `__src_id`/`__dst_id` on edges.
pub struct Graph {
    handle: Arc<GraphHandle>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::from_node(GraphNode::base(GraphData::default(), GraphSchema::default()))
    }

    pub(crate) fn from_node(node: Arc<GraphNode>) -> Self {
        Graph {
            handle: Arc::new(GraphHandle {
                node: RwLock::new(node),
            }),
        }
    }

    pub(crate) fn from_handle(handle: Arc<GraphHandle>) -> Self {
        Graph { handle }
    }

    /// Graph over already-normalized tables with a known schema
    pub(crate) fn from_data(data: GraphData, schema: GraphSchema) -> Self {
        Self::from_node(GraphNode::base(data, schema))
    }

    pub(crate) fn handle(&self) -> &Arc<GraphHandle> {
        &self.handle
    }

    pub(crate) fn node(&self) -> Arc<GraphNode> {
        self.handle.node()
    }

    /// Concrete tables of this graph, evaluating pending operations if needed
    pub(crate) fn data(&self) -> GraphResult<Arc<GraphData>> {
        self.node().materialize()
    }

    /// Build a graph from caller tables.
    ///
    /// `vertex_id` is renamed to `__id`, `source`/`target` to `__src_id`/`__dst_id`;
    /// all other columns become attributes. An empty table (no columns) stands
    /// for "no vertices" or "no edges".
    pub fn construct(
        vertices: Table,
        edges: Table,
        vertex_id: &str,
        source: &str,
        target: &str,
    ) -> GraphResult<Self> {
        let mut graph = Graph::new();
        if vertices.num_columns() > 0 {
            graph = graph.add_vertices(vertices, vertex_id)?;
        }
        if edges.num_columns() > 0 {
            graph = graph.add_edges(edges, source, target)?;
        }
        Ok(graph)
    }

    /// New graph with `table`'s rows upserted as vertices keyed by `id_column`.
    ///
    /// Existing identities take the incoming non-null values of the incoming
    /// columns and keep everything else; new identities are appended.
    pub fn add_vertices(&self, table: Table, id_column: &str) -> GraphResult<Graph> {
        const OP: &str = "add_vertices";
        let table = normalize(OP, table, &[(id_column, VID_COLUMN)])?;
        let node = self.node();
        let mut schema = node.schema().clone();
        if let Some(ty) = table.column_type(VID_COLUMN) {
            schema.unify_id_type(OP, ty)?;
        }
        let types = table.column_types();
        schema.merge_attrs(OP, ElementKind::Vertex, types.iter().map(|(n, t)| (n, *t)))?;
        Ok(Graph::from_node(GraphNode::derive(&node, GraphOp::AddVertices(table), schema)))
    }

    /// New graph with `table`'s rows appended as edges. Never deduplicates.
    pub fn add_edges(&self, table: Table, source: &str, target: &str) -> GraphResult<Graph> {
        const OP: &str = "add_edges";
        if source == target {
            return Err(GraphError::Schema(format!(
                "{}: source and target must be different columns, both are '{}'",
                OP, source
            )));
        }
        let table = normalize(OP, table, &[(source, SRC_COLUMN), (target, DST_COLUMN)])?;
        let node = self.node();
        let mut schema = node.schema().clone();
        for endpoint in [SRC_COLUMN, DST_COLUMN] {
            if let Some(ty) = table.column_type(endpoint) {
                schema.unify_id_type(OP, ty)?;
            }
        }
        let types = table.column_types();
        schema.merge_attrs(OP, ElementKind::Edge, types.iter().map(|(n, t)| (n, *t)))?;
        Ok(Graph::from_node(GraphNode::derive(&node, GraphOp::AddEdges(table), schema)))
    }

    /// Number of vertices; forces materialization on first call
    pub fn vertex_count(&self) -> GraphResult<usize> {
        Ok(self.data()?.num_vertices())
    }

    /// Number of edges; forces materialization on first call
    pub fn edge_count(&self) -> GraphResult<usize> {
        Ok(self.data()?.num_edges())
    }

    pub fn summary(&self) -> GraphResult<GraphSummary> {
        let data = self.data()?;
        Ok(GraphSummary {
            num_vertices: data.num_vertices(),
            num_edges: data.num_edges(),
        })
    }

    /// Evaluate all pending operations now
    pub fn materialize(&self) -> GraphResult<()> {
        self.data().map(|_| ())
    }

    pub fn is_materialized(&self) -> bool {
        self.node().is_materialized()
    }

    pub fn schema(&self) -> GraphSchema {
        self.node().schema().clone()
    }

    pub fn vertex_fields(&self) -> Vec<String> {
        self.node().schema().vertex_fields()
    }

    pub fn edge_fields(&self) -> Vec<String> {
        self.node().schema().edge_fields()
    }

    /// Vertex fields followed by edge fields
    pub fn fields(&self) -> Vec<String> {
        let schema = self.schema();
        let mut fields = schema.vertex_fields();
        fields.extend(schema.edge_fields());
        fields
    }

    /// New graph keeping only the named attribute fields (structural columns always stay).
    ///
    /// A name listed twice is kept once.
    pub fn select_fields(&self, vertex_fields: &[&str], edge_fields: &[&str]) -> GraphResult<Graph> {
        const OP: &str = "select_fields";
        let node = self.node();
        let old = node.schema();
        let mut schema = GraphSchema {
            id_type: old.id_type,
            ..GraphSchema::default()
        };
        let mut keep = |kind: ElementKind, names: &[&str]| -> GraphResult<Vec<String>> {
            let mut kept: Vec<String> = Vec::new();
            for name in names {
                if is_reserved(name) || kept.iter().any(|k| k.as_str() == *name) {
                    continue;
                }
                let ty = old
                    .attrs(kind)
                    .get(*name)
                    .ok_or_else(|| GraphError::no_such_column(OP, name))?;
                schema.attrs_mut(kind).insert(name.to_string(), *ty);
                kept.push(name.to_string());
            }
            Ok(kept)
        };
        let vertex_fields = keep(ElementKind::Vertex, vertex_fields)?;
        let edge_fields = keep(ElementKind::Edge, edge_fields)?;
        let op = GraphOp::SelectFields { vertex_fields, edge_fields };
        Ok(Graph::from_node(GraphNode::derive(&node, op, schema)))
    }

    /// New graph keeping vertices that satisfy `predicate` and the edges among them.
    ///
    /// Predicate errors surface at materialization.
    pub fn filter_vertices<F>(&self, predicate: F) -> Graph
    where
        F: Fn(&Row<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        let node = self.node();
        let schema = node.schema().clone();
        Graph::from_node(GraphNode::derive(&node, GraphOp::FilterVertices(Arc::new(predicate)), schema))
    }

    /// New graph keeping edges that satisfy `predicate`; vertices are untouched
    pub fn filter_edges<F>(&self, predicate: F) -> Graph
    where
        F: Fn(&Row<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        let node = self.node();
        let schema = node.schema().clone();
        Graph::from_node(GraphNode::derive(&node, GraphOp::FilterEdges(Arc::new(predicate)), schema))
    }

    pub fn add_vertex_field(&self, name: &str, expr: impl Into<ColumnExpr>) -> GraphResult<()> {
        self.add_field("add_vertex_field", ElementKind::Vertex, name, expr.into(), false)
    }

    pub fn remove_vertex_field(&self, name: &str) -> GraphResult<()> {
        self.remove_field("remove_vertex_field", ElementKind::Vertex, name)
    }

    pub fn rename_vertex_field(&self, from: &str, to: &str) -> GraphResult<()> {
        self.rename_field("rename_vertex_field", ElementKind::Vertex, from, to)
    }

    pub fn add_edge_field(&self, name: &str, expr: impl Into<ColumnExpr>) -> GraphResult<()> {
        self.add_field("add_edge_field", ElementKind::Edge, name, expr.into(), false)
    }

    pub fn remove_edge_field(&self, name: &str) -> GraphResult<()> {
        self.remove_field("remove_edge_field", ElementKind::Edge, name)
    }

    pub fn rename_edge_field(&self, from: &str, to: &str) -> GraphResult<()> {
        self.rename_field("rename_edge_field", ElementKind::Edge, from, to)
    }

    pub(crate) fn add_field(
        &self,
        operation: &str,
        kind: ElementKind,
        name: &str,
        expr: ColumnExpr,
        replace: bool,
    ) -> GraphResult<()> {
        if is_reserved(name) {
            return Err(GraphError::reserved(operation, name));
        }
        let ty = expr.output_type().ok_or_else(|| {
            GraphError::Schema(format!("{}: cannot infer the type of '{}' from a null value", operation, name))
        })?;
        self.handle.update(|node| {
            let mut schema = node.schema().clone();
            if !replace && schema.attrs(kind).contains_key(name) {
                return Err(crate::table::TableError::DuplicateColumn(name.to_string()).into());
            }
            schema.attrs_mut(kind).insert(name.to_string(), ty);
            let op = GraphOp::AddField {
                kind,
                name: name.to_string(),
                expr,
                replace,
            };
            Ok(GraphNode::derive(node, op, schema))
        })
    }

    pub(crate) fn remove_field(&self, operation: &str, kind: ElementKind, name: &str) -> GraphResult<()> {
        if is_reserved(name) {
            return Err(GraphError::reserved(operation, name));
        }
        self.handle.update(|node| {
            let mut schema = node.schema().clone();
            if schema.attrs_mut(kind).shift_remove(name).is_none() {
                return Err(GraphError::no_such_column(operation, name));
            }
            let op = GraphOp::RemoveField {
                kind,
                name: name.to_string(),
            };
            Ok(GraphNode::derive(node, op, schema))
        })
    }

    pub(crate) fn rename_field(&self, operation: &str, kind: ElementKind, from: &str, to: &str) -> GraphResult<()> {
        for name in [from, to] {
            if is_reserved(name) {
                return Err(GraphError::reserved(operation, name));
            }
        }
        self.handle.update(|node| {
            let old = node.schema();
            let ty = *old
                .attrs(kind)
                .get(from)
                .ok_or_else(|| GraphError::no_such_column(operation, from))?;
            if from != to && old.attrs(kind).contains_key(to) {
                return Err(crate::table::TableError::DuplicateColumn(to.to_string()).into());
            }
            let mut schema = old.clone();
            schema.attrs_mut(kind).clear();
            for (name, t) in old.attrs(kind) {
                if name == from {
                    schema.attrs_mut(kind).insert(to.to_string(), ty);
                } else {
                    schema.attrs_mut(kind).insert(name.clone(), *t);
                }
            }
            let op = GraphOp::RenameField {
                kind,
                from: from.to_string(),
                to: to.to_string(),
            };
            Ok(GraphNode::derive(node, op, schema))
        })
    }
}

/// Rename designated columns to their structural names, rejecting collisions
fn normalize(operation: &str, mut table: Table, designated: &[(&str, &str)]) -> GraphResult<Table> {
    for (given, _) in designated {
        if !table.has_column(given) {
            return Err(GraphError::no_such_column(operation, given));
        }
    }
    for reserved in RESERVED_COLUMNS {
        let claimed = designated.iter().any(|(given, slot)| *given == reserved && *slot == reserved);
        if table.has_column(reserved) && !claimed {
            return Err(GraphError::Schema(format!(
                "{}: column '{}' collides with a reserved structural column",
                operation, reserved
            )));
        }
    }
    for (given, slot) in designated {
        table.rename_column(given, slot)?;
    }
    Ok(table)
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Graph {
    /// A new graph instance over the same immutable node.
    ///
    /// Attribute edits through either instance are invisible to the other.
    fn clone(&self) -> Self {
        Graph::from_node(self.node())
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node();
        f.debug_struct("Graph")
            .field("node", &node)
            .field("vertex_fields", &node.schema().vertex_fields())
            .field("edge_fields", &node.schema().edge_fields())
            .finish()
    }
}
