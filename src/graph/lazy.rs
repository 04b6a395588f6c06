//! Deferred composition of structural operations
//!
//! A graph is a handle to a [`GraphNode`]. Base nodes carry concrete tables;
//! every other node records one operation plus a reference to its parent.
//! Building nodes is cheap. Materialization walks up to the nearest node with
//! cached data, replays the recorded operations forward, and caches the result
//! on the requested node only.

use super::error::{GraphError, GraphResult};
use super::index::GraphData;
use super::schema::{ElementKind, GraphSchema};
use super::{DST_COLUMN, SRC_COLUMN, VID_COLUMN};
use crate::table::{Column, ColumnExpr, RowPredicate, Table, Value, ValueKey};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// One recorded graph transformation
#[derive(Clone)]
pub(crate) enum GraphOp {
    /// Concrete tables
    Base(Arc<GraphData>),
    /// Upsert vertices keyed by `__id`
    AddVertices(Table),
    /// Append edges, creating missing endpoint vertices
    AddEdges(Table),
    /// Add (or with `replace`, overwrite) an attribute column
    AddField {
        kind: ElementKind,
        name: String,
        expr: ColumnExpr,
        replace: bool,
    },
    RemoveField { kind: ElementKind, name: String },
    RenameField { kind: ElementKind, from: String, to: String },
    /// Keep only the listed attribute columns
    SelectFields {
        vertex_fields: Vec<String>,
        edge_fields: Vec<String>,
    },
    /// Keep matching vertices and the edges between them
    FilterVertices(RowPredicate),
    FilterEdges(RowPredicate),
}

impl GraphOp {
    fn name(&self) -> &'static str {
        match self {
            GraphOp::Base(_) => "base",
            GraphOp::AddVertices(_) => "add_vertices",
            GraphOp::AddEdges(_) => "add_edges",
            GraphOp::AddField { .. } => "add_field",
            GraphOp::RemoveField { .. } => "remove_field",
            GraphOp::RenameField { .. } => "rename_field",
            GraphOp::SelectFields { .. } => "select_fields",
            GraphOp::FilterVertices(_) => "filter_vertices",
            GraphOp::FilterEdges(_) => "filter_edges",
        }
    }
}

/// Node of the operation DAG
pub(crate) struct GraphNode {
    id: u64,
    op: GraphOp,
    parent: Option<Arc<GraphNode>>,
    schema: GraphSchema,
    cache: OnceLock<Arc<GraphData>>,
    /// Serializes evaluation so concurrent callers evaluate once
    eval_lock: Mutex<()>,
}

impl GraphNode {
    pub(crate) fn base(data: GraphData, schema: GraphSchema) -> Arc<Self> {
        Self::base_shared(Arc::new(data), schema)
    }

    /// Base node over data already cached elsewhere
    pub(crate) fn base_shared(data: Arc<GraphData>, schema: GraphSchema) -> Arc<Self> {
        let cache = OnceLock::new();
        let _ = cache.set(Arc::clone(&data));
        Arc::new(GraphNode {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            op: GraphOp::Base(data),
            parent: None,
            schema,
            cache,
            eval_lock: Mutex::new(()),
        })
    }

    pub(crate) fn derive(parent: &Arc<GraphNode>, op: GraphOp, schema: GraphSchema) -> Arc<Self> {
        Arc::new(GraphNode {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            op,
            parent: Some(Arc::clone(parent)),
            schema,
            cache: OnceLock::new(),
            eval_lock: Mutex::new(()),
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    pub(crate) fn parent(&self) -> Option<&Arc<GraphNode>> {
        self.parent.as_ref()
    }

    /// Cached data without triggering evaluation
    pub(crate) fn cached(&self) -> Option<Arc<GraphData>> {
        self.cache.get().map(Arc::clone)
    }

    pub(crate) fn is_materialized(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Concrete tables for this node, evaluating pending operations on first call
    pub(crate) fn materialize(&self) -> GraphResult<Arc<GraphData>> {
        if let Some(data) = self.cache.get() {
            return Ok(Arc::clone(data));
        }
        let _guard = self.eval_lock.lock();
        if let Some(data) = self.cache.get() {
            return Ok(Arc::clone(data));
        }

        let mut pending: Vec<&GraphNode> = Vec::new();
        let mut cursor: &GraphNode = self;
        let mut data = loop {
            if let Some(data) = cursor.cache.get() {
                break Arc::clone(data);
            }
            pending.push(cursor);
            match &cursor.parent {
                Some(parent) => cursor = parent.as_ref(),
                None => break Arc::new(GraphData::default()),
            }
        };

        info!("Materializing graph node {} ({} pending operations)", self.id, pending.len());
        for node in pending.iter().rev() {
            debug!("Evaluating node {}: {}", node.id, node.op.name());
            data = Arc::new(node.op.apply(&data)?);
        }
        Ok(Arc::clone(self.cache.get_or_init(|| data)))
    }
}

impl Drop for GraphNode {
    // Unlink long parent chains iteratively instead of recursing through Arc drops.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut inner) => next = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("op", &self.op.name())
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

fn id_positions(vertices: &Table) -> FxHashMap<ValueKey, usize> {
    let mut ids = FxHashMap::default();
    if let Ok(col) = vertices.column(VID_COLUMN) {
        for (i, id) in col.iter().enumerate() {
            ids.insert(ValueKey::from(&id), i);
        }
    }
    ids
}

/// Table with a single `__id` column holding `ids`
fn id_table(ids: Vec<Value>, like: &Table, fallback: &Table, fallback_col: &str) -> GraphResult<Table> {
    let ty = like
        .column_type(VID_COLUMN)
        .or_else(|| fallback.column_type(fallback_col))
        .ok_or_else(|| GraphError::Schema("identity column has no type".to_string()))?;
    let col = Column::from_values(ty, ids)?;
    Ok(Table::from_columns(vec![(VID_COLUMN, col)])?)
}

impl GraphOp {
    fn apply(&self, data: &GraphData) -> GraphResult<GraphData> {
        let shared = |vertices: Arc<Table>, edges: Arc<Table>| GraphData::from_shared(vertices, edges);
        match self {
            GraphOp::Base(base) => Ok(shared(Arc::clone(&base.vertices), Arc::clone(&base.edges))),
            GraphOp::AddVertices(table) => {
                let vertices = upsert_vertices(&data.vertices, table)?;
                Ok(shared(Arc::new(vertices), Arc::clone(&data.edges)))
            }
            GraphOp::AddEdges(table) => {
                let vertices = add_missing_endpoints(&data.vertices, table)?;
                let edges = data.edges.append(table)?;
                Ok(shared(vertices, Arc::new(edges)))
            }
            GraphOp::AddField { kind, name, expr, replace } => {
                let edit = |table: &Table| -> GraphResult<Arc<Table>> {
                    let mut table = table.clone();
                    let col = expr.evaluate(&table, name)?;
                    if *replace {
                        table.replace_column(name.clone(), col)?;
                    } else {
                        table.add_column(name.clone(), col)?;
                    }
                    Ok(Arc::new(table))
                };
                edit_one_side(data, *kind, edit)
            }
            GraphOp::RemoveField { kind, name } => edit_one_side(data, *kind, |table| {
                let mut table = table.clone();
                table.remove_column(name)?;
                Ok(Arc::new(table))
            }),
            GraphOp::RenameField { kind, from, to } => edit_one_side(data, *kind, |table| {
                let mut table = table.clone();
                table.rename_column(from, to)?;
                Ok(Arc::new(table))
            }),
            GraphOp::SelectFields { vertex_fields, edge_fields } => {
                let vertices = project(&data.vertices, &[VID_COLUMN], vertex_fields)?;
                let edges = project(&data.edges, &[SRC_COLUMN, DST_COLUMN], edge_fields)?;
                Ok(GraphData::new(vertices, edges))
            }
            GraphOp::FilterVertices(predicate) => {
                let vertices = data.vertices.try_filter(|row| predicate(row))?;
                let kept: FxHashSet<ValueKey> = match vertices.column(VID_COLUMN) {
                    Ok(col) => col.iter().map(|v| ValueKey::from(&v)).collect(),
                    Err(_) => FxHashSet::default(),
                };
                let edges = data.edges.filter(|row| {
                    let endpoint = |name: &str| {
                        row.get(name)
                            .map_or(false, |v| kept.contains(&ValueKey::from(&v)))
                    };
                    endpoint(SRC_COLUMN) && endpoint(DST_COLUMN)
                });
                Ok(GraphData::new(vertices, edges))
            }
            GraphOp::FilterEdges(predicate) => {
                let edges = data.edges.try_filter(|row| predicate(row))?;
                Ok(shared(Arc::clone(&data.vertices), Arc::new(edges)))
            }
        }
    }
}

/// Rebuild the `kind` side with `edit`, sharing the other side unchanged
fn edit_one_side<F>(data: &GraphData, kind: ElementKind, edit: F) -> GraphResult<GraphData>
where
    F: FnOnce(&Table) -> GraphResult<Arc<Table>>,
{
    Ok(match kind {
        ElementKind::Vertex => GraphData::from_shared(edit(&data.vertices)?, Arc::clone(&data.edges)),
        ElementKind::Edge => GraphData::from_shared(Arc::clone(&data.vertices), edit(&data.edges)?),
    })
}

/// Outer union keyed by identity; non-null incoming cells win
fn upsert_vertices(existing: &Table, incoming: &Table) -> GraphResult<Table> {
    let mut ids = id_positions(existing);
    let incoming_ids = incoming.column(VID_COLUMN)?;

    let mut fresh = Vec::new();
    let mut targets = Vec::with_capacity(incoming.num_rows());
    let mut next = existing.num_rows();
    for row in 0..incoming.num_rows() {
        let id = incoming_ids.get(row);
        if id.is_null() {
            return Err(GraphError::Schema("add_vertices: null vertex identity".to_string()));
        }
        let pos = *ids.entry(ValueKey::from(&id)).or_insert_with(|| {
            fresh.push(id.clone());
            next += 1;
            next - 1
        });
        targets.push(pos);
    }

    let mut merged = if fresh.is_empty() {
        existing.clone()
    } else {
        existing.append(&id_table(fresh, existing, incoming, VID_COLUMN)?)?
    };

    for (name, ty) in incoming.column_types() {
        if name == VID_COLUMN {
            continue;
        }
        if !merged.has_column(&name) {
            merged.add_column(name.clone(), Column::nulls(ty, merged.num_rows()))?;
        }
        let source = incoming.column(&name)?;
        let target = merged.column_mut(&name)?;
        for (row, &pos) in targets.iter().enumerate() {
            if !source.is_null(row) {
                target.set(pos, source.get(row)).map_err(|e| e.in_column(&name))?;
            }
        }
    }
    Ok(merged)
}

/// Vertex table extended with any edge endpoint not yet present
fn add_missing_endpoints(vertices: &Arc<Table>, edges: &Table) -> GraphResult<Arc<Table>> {
    let mut ids = id_positions(vertices);
    let mut missing = Vec::new();
    for col_name in [SRC_COLUMN, DST_COLUMN] {
        let col = edges.column(col_name)?;
        for id in col.iter() {
            if id.is_null() {
                return Err(GraphError::Schema(format!("add_edges: null value in {}", col_name)));
            }
            let key = ValueKey::from(&id);
            if !ids.contains_key(&key) {
                ids.insert(key, usize::MAX);
                missing.push(id);
            }
        }
    }
    if missing.is_empty() {
        return Ok(Arc::clone(vertices));
    }
    debug!("add_edges: creating {} implicit vertices", missing.len());
    Ok(Arc::new(vertices.append(&id_table(missing, vertices, edges, SRC_COLUMN)?)?))
}

fn project(table: &Table, structural: &[&str], fields: &[String]) -> GraphResult<Table> {
    let names: Vec<&str> = structural
        .iter()
        .copied()
        .filter(|name| table.has_column(name))
        .chain(fields.iter().map(String::as_str))
        .collect();
    Ok(table.select_columns(&names)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;

    fn vertices(ids: Vec<i64>, attr: Vec<Option<&str>>) -> Table {
        Table::from_columns(vec![
            (VID_COLUMN, Column::Int(ids.into_iter().map(Some).collect())),
            ("attr", Column::String(attr.into_iter().map(|a| a.map(str::to_string)).collect())),
        ])
        .unwrap()
    }

    #[test]
    fn test_upsert_prefers_non_null_incoming() {
        let existing = vertices(vec![1, 2], vec![Some("x"), Some("y")]);
        let incoming = vertices(vec![2, 3, 2], vec![None, Some("z"), Some("w")]);
        let merged = upsert_vertices(&existing, &incoming).unwrap();
        assert_eq!(merged.num_rows(), 3);
        assert_eq!(merged.value(1, "attr"), Some(Value::from("w")));
        assert_eq!(merged.value(2, VID_COLUMN), Some(Value::from(3)));
        assert_eq!(merged.value(2, "attr"), Some(Value::from("z")));
    }

    #[test]
    fn test_upsert_keeps_absent_columns() {
        let existing = vertices(vec![1], vec![Some("x")]);
        let incoming = Table::from_columns(vec![
            (VID_COLUMN, Column::Int(vec![Some(1)])),
            ("score", Column::Float(vec![Some(0.5)])),
        ])
        .unwrap();
        let merged = upsert_vertices(&existing, &incoming).unwrap();
        assert_eq!(merged.value(0, "attr"), Some(Value::from("x")));
        assert_eq!(merged.value(0, "score"), Some(Value::Float(0.5)));
    }

    #[test]
    fn test_materialize_caches_on_node() {
        let root = GraphNode::base(GraphData::default(), GraphSchema::default());
        let mut schema = GraphSchema::default();
        schema.id_type = Some(ColumnType::Integer);
        let node = GraphNode::derive(&root, GraphOp::AddVertices(vertices(vec![1], vec![None])), schema);
        assert!(!node.is_materialized());
        let first = node.materialize().unwrap();
        assert!(node.is_materialized());
        let second = node.materialize().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.num_vertices(), 1);
    }

    #[test]
    fn test_missing_endpoints_created_once() {
        let existing = Arc::new(vertices(vec![1], vec![Some("x")]));
        let edges = Table::from_columns(vec![
            (SRC_COLUMN, Column::Int(vec![Some(1), Some(2)])),
            (DST_COLUMN, Column::Int(vec![Some(2), Some(2)])),
        ])
        .unwrap();
        let out = add_missing_endpoints(&existing, &edges).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert_eq!(out.value(1, "attr"), Some(Value::Null));

        let again = add_missing_endpoints(&out, &edges).unwrap();
        assert!(Arc::ptr_eq(&again, &out));
    }

    #[test]
    fn test_field_edit_shares_the_other_table() {
        let edges = Table::from_columns(vec![
            (SRC_COLUMN, Column::Int(vec![Some(1)])),
            (DST_COLUMN, Column::Int(vec![Some(1)])),
        ])
        .unwrap();
        let data = GraphData::new(vertices(vec![1], vec![None]), edges);
        let op = GraphOp::AddField {
            kind: ElementKind::Vertex,
            name: "w".to_string(),
            expr: ColumnExpr::from(Value::from(2)),
            replace: false,
        };
        let out = op.apply(&data).unwrap();
        assert!(Arc::ptr_eq(&out.edges, &data.edges));
        assert_eq!(out.vertices.value(0, "w"), Some(Value::from(2)));

        let renamed = GraphOp::RenameField {
            kind: ElementKind::Edge,
            from: SRC_COLUMN.to_string(),
            to: "s".to_string(),
        };
        let out = renamed.apply(&data).unwrap();
        assert!(Arc::ptr_eq(&out.vertices, &data.vertices));
    }
}
