//! Selection: identity and field-equality queries returning detached tables

use super::error::{GraphError, GraphResult};
use super::index::VertexIndex;
use super::schema::ElementKind;
use super::store::Graph;
use super::{DST_COLUMN, SRC_COLUMN};
use crate::table::{ColumnType, Table, Value};

/// One position of an edge identity spec
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Matches any vertex
    Any,
    Id(Value),
}

/// Matches any value in its position
pub const WILDCARD: Selector = Selector::Any;

impl Selector {
    pub fn id(value: impl Into<Value>) -> Self {
        Selector::Id(value.into())
    }
}

/// (source, target) filter over edges; either side may be [`WILDCARD`]
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub source: Selector,
    pub target: Selector,
}

impl EdgeSpec {
    /// Edges from `source` to `target`
    pub fn new(source: impl Into<Value>, target: impl Into<Value>) -> Self {
        EdgeSpec {
            source: Selector::id(source),
            target: Selector::id(target),
        }
    }

    pub fn from_selectors(source: Selector, target: Selector) -> Self {
        EdgeSpec { source, target }
    }

    /// All edges leaving `source`
    pub fn out_of(source: impl Into<Value>) -> Self {
        EdgeSpec {
            source: Selector::id(source),
            target: WILDCARD,
        }
    }

    /// All edges entering `target`
    pub fn into_vertex(target: impl Into<Value>) -> Self {
        EdgeSpec {
            source: WILDCARD,
            target: Selector::id(target),
        }
    }
}

impl Graph {
    /// Vertices whose identity is in `ids` (all if empty) and whose attributes
    /// equal every `(column, value)` constraint.
    pub fn get_vertices(&self, ids: &[Value], constraints: &[(&str, Value)]) -> GraphResult<Table> {
        let constraints = self.check_constraints("get_vertices", ElementKind::Vertex, constraints)?;
        let data = self.data()?;
        let selected = if ids.is_empty() {
            data.vertices().clone()
        } else {
            let index = data.index()?;
            let mut mask = vec![false; data.num_vertices()];
            for id in ids {
                if let Some(v) = index.index_of(id) {
                    mask[v] = true;
                }
            }
            data.vertices().take(&positions(&mask))
        };
        Ok(apply_constraints(&selected, &constraints))
    }

    /// Edges matching any of `specs` (all if empty) and every `(column, value)` constraint
    pub fn get_edges(&self, specs: &[EdgeSpec], constraints: &[(&str, Value)]) -> GraphResult<Table> {
        let constraints = self.check_constraints("get_edges", ElementKind::Edge, constraints)?;
        let data = self.data()?;
        let selected = if specs.is_empty() {
            data.edges().clone()
        } else {
            let index = data.index()?;
            let mut mask = vec![false; data.num_edges()];
            for spec in specs {
                let source = resolve(index, &spec.source);
                let target = resolve(index, &spec.target);
                match (source, target) {
                    (Resolved::Missing, _) | (_, Resolved::Missing) => {}
                    (Resolved::Vertex(s), target) => {
                        for &e in index.out_edges(s) {
                            if target.accepts(index.endpoints(e).1) {
                                mask[e] = true;
                            }
                        }
                    }
                    (Resolved::Any, Resolved::Vertex(t)) => {
                        for &e in index.in_edges(t) {
                            mask[e] = true;
                        }
                    }
                    (Resolved::Any, Resolved::Any) => mask.iter_mut().for_each(|m| *m = true),
                }
            }
            data.edges().take(&positions(&mask))
        };
        Ok(apply_constraints(&selected, &constraints))
    }

    /// Resolve constraint columns and bring each expected value to its column's type.
    ///
    /// Integers compare against float columns as floats; any other mismatch
    /// is rejected. A null expected value matches null cells.
    fn check_constraints(
        &self,
        operation: &str,
        kind: ElementKind,
        constraints: &[(&str, Value)],
    ) -> GraphResult<Vec<(String, Value)>> {
        let node = self.node();
        let schema = node.schema();
        let mut checked = Vec::with_capacity(constraints.len());
        for (column, expected) in constraints {
            if !schema.has_field(kind, column) {
                return Err(GraphError::no_such_column(operation, column));
            }
            let expected = match (schema.field_type(kind, column), expected) {
                (Some(ColumnType::Float), Value::Integer(i)) => Value::Float(*i as f64),
                (Some(ty), value) if value.column_type().map_or(false, |found| found != ty) => {
                    return Err(GraphError::Schema(format!(
                        "{}: constraint on '{}' compares a {} value with a {:?} column",
                        operation,
                        column,
                        value.type_name(),
                        ty
                    )));
                }
                (_, value) => value.clone(),
            };
            checked.push((column.to_string(), expected));
        }
        Ok(checked)
    }
}

enum Resolved {
    Any,
    Vertex(usize),
    /// Identity not in the graph
    Missing,
}

impl Resolved {
    fn accepts(&self, v: usize) -> bool {
        match self {
            Resolved::Any => true,
            Resolved::Vertex(w) => *w == v,
            Resolved::Missing => false,
        }
    }
}

fn resolve(index: &VertexIndex, selector: &Selector) -> Resolved {
    match selector {
        Selector::Any => Resolved::Any,
        Selector::Id(id) => index.index_of(id).map_or(Resolved::Missing, Resolved::Vertex),
    }
}

/// Set positions of `mask`, ascending (storage order)
fn positions(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect()
}

fn apply_constraints(table: &Table, constraints: &[(String, Value)]) -> Table {
    if constraints.is_empty() {
        return table.clone();
    }
    table.filter(|row| {
        constraints
            .iter()
            .all(|(column, expected)| row.get(column).as_ref() == Some(expected))
    })
}
