//! Typed, nullable columns.
//!
//! Values are stored in contiguous per-type vectors rather than as boxed
//! cells, so scanning one attribute across millions of rows stays cache friendly.

use super::frame::{TableError, TableResult};
use super::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Boolean,
}

impl ColumnType {
    /// Type of a value, `None` for null
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::String(_) => Some(ColumnType::String),
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::Null => None,
        }
    }

    /// Whether a value can be stored in a column of this type
    pub fn accepts(&self, value: &Value) -> bool {
        match ColumnType::of(value) {
            None => true,
            Some(ty) if ty == *self => true,
            Some(ColumnType::Integer) => *self == ColumnType::Float,
            Some(_) => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::String => "String",
            ColumnType::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single attribute column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
}

fn place<T: Clone>(v: &mut Vec<Option<T>>, idx: usize, value: Option<T>) {
    if idx >= v.len() {
        v.resize(idx + 1, None);
    }
    v[idx] = value;
}

impl Column {
    pub fn new(ty: ColumnType) -> Self {
        Self::nulls(ty, 0)
    }

    /// Column of `len` null cells
    pub fn nulls(ty: ColumnType, len: usize) -> Self {
        match ty {
            ColumnType::Integer => Column::Int(vec![None; len]),
            ColumnType::Float => Column::Float(vec![None; len]),
            ColumnType::String => Column::String(vec![None; len]),
            ColumnType::Boolean => Column::Bool(vec![None; len]),
        }
    }

    /// Build a column from values, checking each one against `ty`
    pub fn from_values<I>(ty: ColumnType, values: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut col = Column::new(ty);
        for value in values {
            col.push(value)?;
        }
        Ok(col)
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int(_) => ColumnType::Integer,
            Column::Float(_) => ColumnType::Float,
            Column::String(_) => ColumnType::String,
            Column::Bool(_) => ColumnType::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::String(v) => v.len(),
            Column::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `value` at `idx`, growing the column with nulls if needed.
    ///
    /// Integers are widened when written into a float column; any other type
    /// mismatch is rejected.
    pub fn set(&mut self, idx: usize, value: Value) -> TableResult<()> {
        let expected = self.column_type();
        match (self, value) {
            (Column::Int(v), Value::Integer(x)) => place(v, idx, Some(x)),
            (Column::Float(v), Value::Float(x)) => place(v, idx, Some(x)),
            (Column::Float(v), Value::Integer(x)) => place(v, idx, Some(x as f64)),
            (Column::String(v), Value::String(x)) => place(v, idx, Some(x)),
            (Column::Bool(v), Value::Boolean(x)) => place(v, idx, Some(x)),
            (Column::Int(v), Value::Null) => place(v, idx, None),
            (Column::Float(v), Value::Null) => place(v, idx, None),
            (Column::String(v), Value::Null) => place(v, idx, None),
            (Column::Bool(v), Value::Null) => place(v, idx, None),
            (_, other) => {
                return Err(TableError::TypeMismatch {
                    column: String::new(),
                    expected,
                    found: other.type_name().to_string(),
                })
            }
        }
        Ok(())
    }

    pub fn push(&mut self, value: Value) -> TableResult<()> {
        let idx = self.len();
        self.set(idx, value)
    }

    pub fn get(&self, idx: usize) -> Value {
        match self {
            Column::Int(v) => v.get(idx).and_then(|&o| o).map(Value::Integer).unwrap_or(Value::Null),
            Column::Float(v) => v.get(idx).and_then(|&o| o).map(Value::Float).unwrap_or(Value::Null),
            Column::Bool(v) => v.get(idx).and_then(|&o| o).map(Value::Boolean).unwrap_or(Value::Null),
            Column::String(v) => v
                .get(idx)
                .and_then(|o| o.as_ref())
                .map(|s| Value::String(s.clone()))
                .unwrap_or(Value::Null),
        }
    }

    /// Whether the cell at `idx` is null (or out of range)
    pub fn is_null(&self, idx: usize) -> bool {
        match self {
            Column::Int(v) => v.get(idx).map_or(true, Option::is_none),
            Column::Float(v) => v.get(idx).map_or(true, Option::is_none),
            Column::String(v) => v.get(idx).map_or(true, Option::is_none),
            Column::Bool(v) => v.get(idx).map_or(true, Option::is_none),
        }
    }

    /// Gather the given rows into a new column
    pub fn take(&self, indices: &[usize]) -> Column {
        fn gather<T: Clone>(v: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
            indices.iter().map(|&i| v.get(i).cloned().flatten()).collect()
        }
        match self {
            Column::Int(v) => Column::Int(gather(v, indices)),
            Column::Float(v) => Column::Float(gather(v, indices)),
            Column::String(v) => Column::String(gather(v, indices)),
            Column::Bool(v) => Column::Bool(gather(v, indices)),
        }
    }

    /// Pad with nulls (or truncate) to `len` rows
    pub fn resize(&mut self, len: usize) {
        match self {
            Column::Int(v) => v.resize(len, None),
            Column::Float(v) => v.resize(len, None),
            Column::String(v) => v.resize(len, None),
            Column::Bool(v) => v.resize(len, None),
        }
    }

    /// Append every cell of `other` to this column
    pub fn extend_from(&mut self, other: &Column) -> TableResult<()> {
        match (&mut *self, other) {
            (Column::Int(a), Column::Int(b)) => a.extend_from_slice(b),
            (Column::Float(a), Column::Float(b)) => a.extend_from_slice(b),
            (Column::String(a), Column::String(b)) => a.extend_from_slice(b),
            (Column::Bool(a), Column::Bool(b)) => a.extend_from_slice(b),
            (Column::Float(a), Column::Int(b)) => a.extend(b.iter().map(|o| o.map(|x| x as f64))),
            (this, other) => {
                return Err(TableError::TypeMismatch {
                    column: String::new(),
                    expected: this.column_type(),
                    found: other.column_type().name().to_string(),
                })
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
