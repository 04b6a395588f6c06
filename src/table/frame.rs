//! Column-ordered attribute table
//!
//! A `Table` is a set of equally long named columns. Read-returning
//! operations (`take`, `filter`, `append`, `select_columns`, `join`, `groupby`)
//! always produce new storage; nothing returned here aliases its source.

use super::column::{Column, ColumnType};
use super::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by table operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("Type mismatch in column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: String,
    },

    #[error("Column '{column}' has {found} rows but the table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Expression for column '{column}' failed: {message}")]
    Expression { column: String, message: String },

    #[error("Filter predicate failed: {0}")]
    Predicate(String),
}

impl TableError {
    /// Attach a column name to errors raised below the table level
    pub fn in_column(self, name: &str) -> Self {
        match self {
            TableError::TypeMismatch { expected, found, .. } => TableError::TypeMismatch {
                column: name.to_string(),
                expected,
                found,
            },
            other => other,
        }
    }
}

pub type TableResult<T> = Result<T, TableError>;

/// Named, typed columns sharing one row count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: IndexMap<String, Column>,
    num_rows: usize,
}

impl Table {
    /// Create an empty table with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table with the given schema
    pub fn with_schema(schema: &[(String, ColumnType)]) -> TableResult<Self> {
        let mut table = Table::new();
        for (name, ty) in schema {
            table.add_column(name.clone(), Column::new(*ty))?;
        }
        Ok(table)
    }

    /// Build a table from `(name, column)` pairs of equal length
    pub fn from_columns<I, S>(columns: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, col) in columns {
            table.add_column(name, col)?;
        }
        Ok(table)
    }

    /// Build a table from row-major values
    pub fn from_rows(schema: &[(String, ColumnType)], rows: Vec<Vec<Value>>) -> TableResult<Self> {
        let mut columns: Vec<Column> = schema
            .iter()
            .map(|(_, ty)| Column::new(*ty))
            .collect();
        let num_rows = rows.len();
        for row in rows {
            if row.len() != schema.len() {
                return Err(TableError::LengthMismatch {
                    column: "<row>".to_string(),
                    expected: schema.len(),
                    found: row.len(),
                });
            }
            for (i, value) in row.into_iter().enumerate() {
                columns[i].push(value).map_err(|e| e.in_column(&schema[i].0))?;
            }
        }
        let mut table = Table::new();
        for ((name, _), col) in schema.iter().zip(columns) {
            table.add_column(name.clone(), col)?;
        }
        table.num_rows = num_rows;
        Ok(table)
    }

    /// Row-major copy of every cell, in column order
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        (0..self.num_rows)
            .map(|i| self.columns.values().map(|c| c.get(i)).collect())
            .collect()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Schema as `(name, type)` pairs in column order
    pub fn column_types(&self) -> Vec<(String, ColumnType)> {
        self.columns
            .iter()
            .map(|(name, col)| (name.clone(), col.column_type()))
            .collect()
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).map(Column::column_type)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    pub fn column(&self, name: &str) -> TableResult<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> TableResult<&mut Column> {
        self.columns
            .get_mut(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    /// Cell value, `None` if the column does not exist
    pub fn value(&self, row: usize, column: &str) -> Option<Value> {
        self.columns.get(column).map(|c| c.get(row))
    }

    /// Append a new column; the first column fixes the row count
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> TableResult<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        self.check_length(&name, &column)?;
        if self.columns.is_empty() {
            self.num_rows = column.len();
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Insert or overwrite a column, keeping its position if it already exists
    pub fn replace_column(&mut self, name: impl Into<String>, column: Column) -> TableResult<()> {
        let name = name.into();
        self.check_length(&name, &column)?;
        if self.columns.is_empty() {
            self.num_rows = column.len();
        }
        self.columns.insert(name, column);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> TableResult<Column> {
        self.columns
            .shift_remove(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> TableResult<()> {
        if !self.columns.contains_key(from) {
            return Err(TableError::ColumnNotFound(from.to_string()));
        }
        if from == to {
            return Ok(());
        }
        if self.columns.contains_key(to) {
            return Err(TableError::DuplicateColumn(to.to_string()));
        }
        self.columns = std::mem::take(&mut self.columns)
            .into_iter()
            .map(|(name, col)| if name == from { (to.to_string(), col) } else { (name, col) })
            .collect();
        Ok(())
    }

    fn check_length(&self, name: &str, column: &Column) -> TableResult<()> {
        if !self.columns.is_empty() && column.len() != self.num_rows {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.num_rows,
                found: column.len(),
            });
        }
        Ok(())
    }

    /// Projection onto the named columns, in the order given
    pub fn select_columns(&self, names: &[&str]) -> TableResult<Table> {
        let mut out = Table::new();
        for name in names {
            out.add_column(*name, self.column(name)?.clone())?;
        }
        out.num_rows = self.num_rows;
        Ok(out)
    }

    pub fn row(&self, index: usize) -> Row<'_> {
        Row { table: self, index }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.num_rows).map(move |index| Row { table: self, index })
    }

    /// Gather the given rows (in the given order) into a new table
    pub fn take(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|(name, col)| (name.clone(), col.take(indices)))
                .collect(),
            num_rows: indices.len(),
        }
    }

    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..n.min(self.num_rows)).collect();
        self.take(&indices)
    }

    /// Rows for which `predicate` holds
    pub fn filter<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        let indices: Vec<usize> = self
            .rows()
            .filter(|row| predicate(row))
            .map(|row| row.index)
            .collect();
        self.take(&indices)
    }

    /// Fallible variant of [`Table::filter`]; the first predicate error aborts
    pub fn try_filter<F>(&self, mut predicate: F) -> TableResult<Table>
    where
        F: FnMut(&Row<'_>) -> anyhow::Result<bool>,
    {
        let mut indices = Vec::new();
        for row in self.rows() {
            if predicate(&row).map_err(|e| TableError::Predicate(e.to_string()))? {
                indices.push(row.index);
            }
        }
        Ok(self.take(&indices))
    }

    /// Row-wise concatenation over the union of both schemas.
    ///
    /// Cells of columns missing on either side are null.
    pub fn append(&self, other: &Table) -> TableResult<Table> {
        let total = self.num_rows + other.num_rows;
        let mut out = Table::new();
        for (name, col) in &self.columns {
            let mut merged = col.clone();
            match other.columns.get(name) {
                Some(theirs) => merged.extend_from(theirs).map_err(|e| e.in_column(name))?,
                None => merged.resize(total),
            }
            out.add_column(name.clone(), merged)?;
        }
        for (name, col) in &other.columns {
            if self.columns.contains_key(name) {
                continue;
            }
            let mut merged = Column::nulls(col.column_type(), self.num_rows);
            merged.extend_from(col).map_err(|e| e.in_column(name))?;
            out.add_column(name.clone(), merged)?;
        }
        out.num_rows = total;
        Ok(out)
    }
}

/// Borrowed view of a single table row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of the row in its table
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell value, `None` if the column does not exist
    pub fn get(&self, column: &str) -> Option<Value> {
        self.table.value(self.index, column)
    }

    /// Cell value, erroring if the column does not exist
    pub fn try_get(&self, column: &str) -> TableResult<Value> {
        self.get(column)
            .ok_or_else(|| TableError::ColumnNotFound(column.to_string()))
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.table.columns.values().map(|c| c.get(self.index)).collect()
    }
}
