//! Overlay views: attribute mutation bound to one graph instance
//!
//! An [`AttributeView`] is a plain capability pair, the table it addresses
//! (vertices or edges) and a non-owning reference to the graph that owns it.
//! Mutators forward to the graph's field primitives, so edits land on the
//! bound instance only. Every read-returning operation hands back a detached
//! [`Table`].

use super::error::{GraphError, GraphResult};
use super::schema::ElementKind;
use super::store::{Graph, GraphHandle};
use crate::table::{Aggregate, ColumnExpr, Row, Table};
use std::sync::{Arc, Weak};

/// Mutable attribute proxy over the vertex or edge table of a graph
#[derive(Debug, Clone)]
pub struct AttributeView {
    graph: Weak<GraphHandle>,
    kind: ElementKind,
}

impl Graph {
    /// Overlay view of the vertex attribute table
    pub fn vertices(&self) -> AttributeView {
        AttributeView::new(self, ElementKind::Vertex)
    }

    /// Overlay view of the edge attribute table
    pub fn edges(&self) -> AttributeView {
        AttributeView::new(self, ElementKind::Edge)
    }
}

impl AttributeView {
    fn new(graph: &Graph, kind: ElementKind) -> Self {
        AttributeView {
            graph: Arc::downgrade(graph.handle()),
            kind,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The bound graph, if the caller still holds it
    fn graph(&self) -> GraphResult<Graph> {
        self.graph
            .upgrade()
            .map(Graph::from_handle)
            .ok_or(GraphError::GraphDropped)
    }

    fn table(&self) -> GraphResult<Table> {
        let data = self.graph()?.data()?;
        Ok(match self.kind {
            ElementKind::Vertex => data.vertices().clone(),
            ElementKind::Edge => data.edges().clone(),
        })
    }

    /// Add a new attribute column; fails if it already exists
    pub fn add_column(&self, name: &str, expr: impl Into<ColumnExpr>) -> GraphResult<()> {
        self.graph()?.add_field("add_column", self.kind, name, expr.into(), false)
    }

    /// Create or overwrite an attribute column
    pub fn assign_column(&self, name: &str, expr: impl Into<ColumnExpr>) -> GraphResult<()> {
        self.graph()?.add_field("assign_column", self.kind, name, expr.into(), true)
    }

    pub fn remove_column(&self, name: &str) -> GraphResult<()> {
        self.graph()?.remove_field("remove_column", self.kind, name)
    }

    pub fn rename_column(&self, from: &str, to: &str) -> GraphResult<()> {
        self.graph()?.rename_field("rename_column", self.kind, from, to)
    }

    /// Column names, structural first. Does not materialize.
    pub fn column_names(&self) -> GraphResult<Vec<String>> {
        let graph = self.graph()?;
        Ok(match self.kind {
            ElementKind::Vertex => graph.vertex_fields(),
            ElementKind::Edge => graph.edge_fields(),
        })
    }

    pub fn num_rows(&self) -> GraphResult<usize> {
        let graph = self.graph()?;
        match self.kind {
            ElementKind::Vertex => graph.vertex_count(),
            ElementKind::Edge => graph.edge_count(),
        }
    }

    /// Detached copy of the whole table
    pub fn to_table(&self) -> GraphResult<Table> {
        self.table()
    }

    pub fn head(&self, n: usize) -> GraphResult<Table> {
        Ok(self.table()?.head(n))
    }

    pub fn filter<F>(&self, predicate: F) -> GraphResult<Table>
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        Ok(self.table()?.filter(predicate))
    }

    pub fn select_columns(&self, names: &[&str]) -> GraphResult<Table> {
        Ok(self.table()?.select_columns(names)?)
    }

    pub fn groupby(&self, keys: &[&str], aggregates: &[(&str, Aggregate)]) -> GraphResult<Table> {
        Ok(self.table()?.groupby(keys, aggregates)?)
    }

    pub fn join(&self, other: &Table, on: &str) -> GraphResult<Table> {
        Ok(self.table()?.join(other, on)?)
    }
}
