//! Graph schema metadata
//!
//! Tracked eagerly on every lazy node so that column-name and column-type
//! errors are raised by the call that introduces them, without materializing.

use super::error::{GraphError, GraphResult};
use super::{is_reserved, DST_COLUMN, SRC_COLUMN, VID_COLUMN};
use crate::table::ColumnType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which attribute table an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => write!(f, "vertex"),
            ElementKind::Edge => write!(f, "edge"),
        }
    }
}

/// Identity type plus attribute column types of both tables
///
/// Attribute maps never contain the structural columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSchema {
    /// Type of vertex identities; `None` until the first vertex or edge is added
    pub id_type: Option<ColumnType>,
    pub vertex_attrs: IndexMap<String, ColumnType>,
    pub edge_attrs: IndexMap<String, ColumnType>,
}

impl GraphSchema {
    pub fn attrs(&self, kind: ElementKind) -> &IndexMap<String, ColumnType> {
        match kind {
            ElementKind::Vertex => &self.vertex_attrs,
            ElementKind::Edge => &self.edge_attrs,
        }
    }

    pub(crate) fn attrs_mut(&mut self, kind: ElementKind) -> &mut IndexMap<String, ColumnType> {
        match kind {
            ElementKind::Vertex => &mut self.vertex_attrs,
            ElementKind::Edge => &mut self.edge_attrs,
        }
    }

    /// All vertex columns, structural first
    pub fn vertex_fields(&self) -> Vec<String> {
        std::iter::once(VID_COLUMN.to_string())
            .chain(self.vertex_attrs.keys().cloned())
            .collect()
    }

    /// All edge columns, structural first
    pub fn edge_fields(&self) -> Vec<String> {
        [SRC_COLUMN, DST_COLUMN]
            .iter()
            .map(|s| s.to_string())
            .chain(self.edge_attrs.keys().cloned())
            .collect()
    }

    pub fn has_field(&self, kind: ElementKind, name: &str) -> bool {
        match kind {
            ElementKind::Vertex => name == VID_COLUMN || self.vertex_attrs.contains_key(name),
            ElementKind::Edge => {
                name == SRC_COLUMN || name == DST_COLUMN || self.edge_attrs.contains_key(name)
            }
        }
    }

    /// Declared type of a field, structural columns included
    pub fn field_type(&self, kind: ElementKind, name: &str) -> Option<ColumnType> {
        let structural = match kind {
            ElementKind::Vertex => name == VID_COLUMN,
            ElementKind::Edge => name == SRC_COLUMN || name == DST_COLUMN,
        };
        if structural {
            self.id_type
        } else {
            self.attrs(kind).get(name).copied()
        }
    }

    /// Fix the identity type, or check it against the one already fixed
    pub(crate) fn unify_id_type(&mut self, operation: &str, ty: ColumnType) -> GraphResult<()> {
        if !matches!(ty, ColumnType::Integer | ColumnType::String) {
            return Err(GraphError::Schema(format!(
                "{}: vertex identities must be Integer or String, got {}",
                operation, ty
            )));
        }
        match self.id_type {
            Some(existing) if existing != ty => Err(GraphError::Schema(format!(
                "{}: identity type {} does not match the graph's identity type {}",
                operation, ty, existing
            ))),
            _ => {
                self.id_type = Some(ty);
                Ok(())
            }
        }
    }

    /// Merge incoming attribute columns into the schema, rejecting type conflicts.
    ///
    /// Integers may flow into an existing Float attribute.
    pub(crate) fn merge_attrs<'a, I>(&mut self, operation: &str, kind: ElementKind, columns: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (&'a String, ColumnType)>,
    {
        for (name, ty) in columns {
            if is_reserved(name) {
                continue;
            }
            let attrs = self.attrs_mut(kind);
            match attrs.get(name) {
                None => {
                    attrs.insert(name.clone(), ty);
                }
                Some(existing) if *existing == ty => {}
                Some(ColumnType::Float) if ty == ColumnType::Integer => {}
                Some(existing) => {
                    return Err(GraphError::Schema(format!(
                        "{}: {} attribute '{}' has type {} but new data has type {}",
                        operation, kind, name, existing, ty
                    )))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_type_unification() {
        let mut schema = GraphSchema::default();
        schema.unify_id_type("t", ColumnType::Integer).unwrap();
        assert!(schema.unify_id_type("t", ColumnType::Integer).is_ok());
        assert!(matches!(
            schema.unify_id_type("t", ColumnType::String),
            Err(GraphError::Schema(_))
        ));
        let mut fresh = GraphSchema::default();
        assert!(fresh.unify_id_type("t", ColumnType::Float).is_err());
    }

    #[test]
    fn test_merge_attrs() {
        let mut schema = GraphSchema::default();
        let score = "score".to_string();
        let id = VID_COLUMN.to_string();
        schema
            .merge_attrs("t", ElementKind::Vertex, vec![(&id, ColumnType::Integer), (&score, ColumnType::Float)])
            .unwrap();
        assert_eq!(schema.vertex_fields(), vec!["__id", "score"]);
        // integer data widens into the float attribute
        assert!(schema.merge_attrs("t", ElementKind::Vertex, vec![(&score, ColumnType::Integer)]).is_ok());
        assert!(schema.merge_attrs("t", ElementKind::Vertex, vec![(&score, ColumnType::String)]).is_err());
        assert!(schema.has_field(ElementKind::Edge, SRC_COLUMN));
        assert!(!schema.has_field(ElementKind::Edge, "score"));
    }
}
