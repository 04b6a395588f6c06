//! Column expressions: the value-or-expression accepted when adding or
//! assigning an attribute column.

use super::column::{Column, ColumnType};
use super::frame::{Row, Table, TableError, TableResult};
use super::value::Value;
use std::fmt;
use std::sync::Arc;

/// Per-row computation producing one cell
pub type RowFn = Arc<dyn Fn(&Row<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// Per-row boolean test
pub type RowPredicate = Arc<dyn Fn(&Row<'_>) -> anyhow::Result<bool> + Send + Sync>;

/// Source of a new column's contents
#[derive(Clone)]
pub enum ColumnExpr {
    /// Same value in every row
    Constant(Value),
    /// Explicit values, one per row
    Values(Column),
    /// Computed from each row of the table the column is added to
    Map { output: ColumnType, f: RowFn },
}

impl ColumnExpr {
    pub fn constant(value: impl Into<Value>) -> Self {
        ColumnExpr::Constant(value.into())
    }

    pub fn map<F>(output: ColumnType, f: F) -> Self
    where
        F: Fn(&Row<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        ColumnExpr::Map {
            output,
            f: Arc::new(f),
        }
    }

    /// Type of the resulting column, if it can be known without evaluating
    pub fn output_type(&self) -> Option<ColumnType> {
        match self {
            ColumnExpr::Constant(v) => v.column_type(),
            ColumnExpr::Values(col) => Some(col.column_type()),
            ColumnExpr::Map { output, .. } => Some(*output),
        }
    }

    /// Produce the column for `table`; `column` names the target for error reporting
    pub fn evaluate(&self, table: &Table, column: &str) -> TableResult<Column> {
        let n = table.num_rows();
        match self {
            ColumnExpr::Constant(value) => {
                let ty = value.column_type().ok_or_else(|| TableError::Expression {
                    column: column.to_string(),
                    message: "cannot infer a column type from a null constant".to_string(),
                })?;
                Column::from_values(ty, std::iter::repeat(value.clone()).take(n))
                    .map_err(|e| e.in_column(column))
            }
            ColumnExpr::Values(col) => {
                if col.len() != n {
                    return Err(TableError::LengthMismatch {
                        column: column.to_string(),
                        expected: n,
                        found: col.len(),
                    });
                }
                Ok(col.clone())
            }
            ColumnExpr::Map { output, f } => {
                let mut out = Column::new(*output);
                for row in table.rows() {
                    let value = f(&row).map_err(|e| TableError::Expression {
                        column: column.to_string(),
                        message: e.to_string(),
                    })?;
                    out.push(value).map_err(|e| e.in_column(column))?;
                }
                Ok(out)
            }
        }
    }
}

impl fmt::Debug for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnExpr::Constant(v) => write!(f, "Constant({})", v),
            ColumnExpr::Values(col) => write!(f, "Values({} x {})", col.len(), col.column_type()),
            ColumnExpr::Map { output, .. } => write!(f, "Map(-> {})", output),
        }
    }
}

impl From<Value> for ColumnExpr {
    fn from(value: Value) -> Self {
        ColumnExpr::Constant(value)
    }
}

impl From<Column> for ColumnExpr {
    fn from(col: Column) -> Self {
        ColumnExpr::Values(col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> Table {
        Table::from_columns(vec![("x", Column::Int(vec![Some(1), Some(2), None]))]).unwrap()
    }

    #[test]
    fn test_constant_broadcasts() {
        let col = ColumnExpr::constant(true).evaluate(&numbers(), "flag").unwrap();
        assert_eq!(col, Column::Bool(vec![Some(true); 3]));
    }

    #[test]
    fn test_null_constant_rejected() {
        let err = ColumnExpr::constant(Value::Null).evaluate(&numbers(), "n").unwrap_err();
        assert!(matches!(err, TableError::Expression { .. }));
    }

    #[test]
    fn test_map_expression() {
        let double = ColumnExpr::map(ColumnType::Integer, |row| {
            Ok(row.get("x").and_then(|v| v.as_integer()).map(|x| x * 2).into())
        });
        let col = double.evaluate(&numbers(), "y").unwrap();
        assert_eq!(col, Column::Int(vec![Some(2), Some(4), None]));
    }

    #[test]
    fn test_map_type_error_names_column() {
        let bad = ColumnExpr::map(ColumnType::Integer, |_| Ok(Value::from("text")));
        let err = bad.evaluate(&numbers(), "y").unwrap_err();
        assert!(matches!(err, TableError::TypeMismatch { ref column, .. } if column == "y"));
    }

    #[test]
    fn test_values_length_checked() {
        let err = ColumnExpr::from(Column::Int(vec![Some(1)]))
            .evaluate(&numbers(), "z")
            .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { expected: 3, found: 1, .. }));
    }
}
