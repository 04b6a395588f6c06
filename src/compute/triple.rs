//! Records handed to the triple-apply callback

use crate::graph::schema::ElementKind;
use crate::graph::VID_COLUMN;
use crate::table::{ColumnType, Table, Value};
use rustc_hash::FxHashMap;

/// Column positions and write permissions for one attribute table
#[derive(Debug)]
pub(crate) struct FieldLayout {
    kind: ElementKind,
    positions: FxHashMap<String, usize>,
    names: Vec<String>,
    types: Vec<ColumnType>,
    declared: Vec<bool>,
    id_position: Option<usize>,
}

impl FieldLayout {
    pub(crate) fn new(kind: ElementKind, table: &Table, mutated: &[String]) -> Self {
        let columns = table.column_types();
        let positions: FxHashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        let declared = columns.iter().map(|(name, _)| mutated.contains(name)).collect();
        let id_position = match kind {
            ElementKind::Vertex => positions.get(VID_COLUMN).copied(),
            ElementKind::Edge => None,
        };
        FieldLayout {
            kind,
            positions,
            names: columns.iter().map(|(name, _)| name.clone()).collect(),
            types: columns.into_iter().map(|(_, ty)| ty).collect(),
            declared,
            id_position,
        }
    }

    pub(crate) fn kind(&self) -> ElementKind {
        self.kind
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub(crate) fn name(&self, position: usize) -> &str {
        &self.names[position]
    }

    pub(crate) fn column_type(&self, position: usize) -> ColumnType {
        self.types[position]
    }

    pub(crate) fn declared_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.declared
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| d.then_some(i))
    }

    fn is_declared(&self, position: usize) -> bool {
        self.declared[position]
    }
}

/// Attributes of one vertex or edge as seen by the callback.
///
/// Reads see the callback's own writes. Writes are buffered and reach
/// storage only for declared fields, after the callback returns.
#[derive(Debug)]
pub struct Record<'a> {
    layout: &'a FieldLayout,
    base: &'a [Value],
    writes: Vec<(usize, Value)>,
    undeclared: Option<String>,
}

impl<'a> Record<'a> {
    pub(crate) fn new(layout: &'a FieldLayout, base: &'a [Value]) -> Self {
        Record {
            layout,
            base,
            writes: Vec::new(),
            undeclared: None,
        }
    }

    /// Identity of a vertex record; `Null` for edge records
    pub fn id(&self) -> &Value {
        const NULL: &Value = &Value::Null;
        self.layout.id_position.map_or(NULL, |p| &self.base[p])
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let position = self.layout.position(name)?;
        let written = self.writes.iter().rev().find(|(p, _)| *p == position);
        Some(written.map_or(&self.base[position], |(_, v)| v))
    }

    /// Numeric field as `f64`; integers are widened
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_integer)
    }

    /// Write a field. Writing a field that was not declared as mutated fails
    /// the whole triple-apply once the callback returns.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        match self.layout.position(name) {
            Some(position) if self.layout.is_declared(position) => {
                let value = value.into();
                match self.writes.iter_mut().find(|(p, _)| *p == position) {
                    Some(slot) => slot.1 = value,
                    None => self.writes.push((position, value)),
                }
            }
            _ => {
                if self.undeclared.is_none() {
                    self.undeclared = Some(name.to_string());
                }
            }
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.layout.names.iter().map(String::as_str)
    }

    /// Buffered writes, or the first undeclared field the callback touched
    pub(crate) fn into_writes(self) -> Result<Vec<(usize, Value)>, String> {
        match self.undeclared {
            Some(field) => Err(field),
            None => Ok(self.writes),
        }
    }
}

/// (source vertex, edge, target vertex) presented to the callback
#[derive(Debug)]
pub struct Triple<'a> {
    pub source: Record<'a>,
    pub edge: Record<'a>,
    pub target: Record<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn layout() -> (FieldLayout, Vec<Value>) {
        let table = Table::from_columns(vec![
            (VID_COLUMN, Column::Int(vec![Some(7)])),
            ("rank", Column::Float(vec![Some(0.5)])),
            ("label", Column::String(vec![Some("a".to_string())])),
        ])
        .unwrap();
        let row = table.row(0).to_vec();
        (FieldLayout::new(ElementKind::Vertex, &table, &["rank".to_string()]), row)
    }

    #[test]
    fn test_reads_see_own_writes() {
        let (layout, row) = layout();
        let mut record = Record::new(&layout, &row);
        assert_eq!(record.id(), &Value::from(7));
        assert_eq!(record.get_float("rank"), Some(0.5));
        record.set("rank", 2.0);
        record.set("rank", 3.0);
        assert_eq!(record.get_float("rank"), Some(3.0));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.into_writes().unwrap(), vec![(1, Value::Float(3.0))]);
    }

    #[test]
    fn test_undeclared_write_is_reported() {
        let (layout, row) = layout();
        let mut record = Record::new(&layout, &row);
        record.set("label", "b");
        record.set(VID_COLUMN, 9);
        // undeclared writes stay invisible
        assert_eq!(record.get("label"), Some(&Value::from("a")));
        assert_eq!(record.into_writes().unwrap_err(), "label");
    }
}
