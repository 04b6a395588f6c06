//! Relational operations over tables: equi-join and group-by aggregation.

use super::column::{Column, ColumnType};
use super::frame::{Table, TableError, TableResult};
use super::value::{Value, ValueKey};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Aggregation applied per group
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// Number of rows in the group
    Count,
    /// Sum of a numeric column (nulls skipped)
    Sum(String),
    /// Minimum of a numeric column
    Min(String),
    /// Maximum of a numeric column
    Max(String),
    /// Arithmetic mean of a numeric column
    Mean(String),
}

impl Aggregate {
    fn input(&self) -> Option<&str> {
        match self {
            Aggregate::Count => None,
            Aggregate::Sum(c) | Aggregate::Min(c) | Aggregate::Max(c) | Aggregate::Mean(c) => Some(c.as_str()),
        }
    }

    fn output_type(&self, input: Option<ColumnType>) -> ColumnType {
        match self {
            Aggregate::Count => ColumnType::Integer,
            Aggregate::Mean(_) => ColumnType::Float,
            _ => input.unwrap_or(ColumnType::Float),
        }
    }
}

#[derive(Debug, Clone)]
enum Accumulator {
    Count(i64),
    Sum(Option<f64>),
    Min(Option<f64>),
    Max(Option<f64>),
    Mean(f64, usize),
}

impl Accumulator {
    fn new(agg: &Aggregate) -> Self {
        match agg {
            Aggregate::Count => Accumulator::Count(0),
            Aggregate::Sum(_) => Accumulator::Sum(None),
            Aggregate::Min(_) => Accumulator::Min(None),
            Aggregate::Max(_) => Accumulator::Max(None),
            Aggregate::Mean(_) => Accumulator::Mean(0.0, 0),
        }
    }

    fn update(&mut self, value: Option<f64>) {
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum(acc) => {
                if let Some(x) = value {
                    *acc = Some(acc.unwrap_or(0.0) + x);
                }
            }
            Accumulator::Min(acc) => {
                if let Some(x) = value {
                    *acc = Some(acc.map_or(x, |m| m.min(x)));
                }
            }
            Accumulator::Max(acc) => {
                if let Some(x) = value {
                    *acc = Some(acc.map_or(x, |m| m.max(x)));
                }
            }
            Accumulator::Mean(sum, n) => {
                if let Some(x) = value {
                    *sum += x;
                    *n += 1;
                }
            }
        }
    }

    fn finish(&self, output: ColumnType) -> Value {
        let numeric = match self {
            Accumulator::Count(n) => return Value::Integer(*n),
            Accumulator::Sum(v) | Accumulator::Min(v) | Accumulator::Max(v) => *v,
            Accumulator::Mean(_, 0) => None,
            Accumulator::Mean(sum, n) => Some(*sum / *n as f64),
        };
        match (numeric, output) {
            (None, _) => Value::Null,
            (Some(x), ColumnType::Integer) => Value::Integer(x as i64),
            (Some(x), _) => Value::Float(x),
        }
    }
}

impl Table {
    /// Inner equi-join on column `on`, present in both tables.
    ///
    /// Right-hand columns whose names collide with left-hand ones are suffixed `.1`.
    pub fn join(&self, other: &Table, on: &str) -> TableResult<Table> {
        let left_key = self.column(on)?;
        let right_key = other.column(on)?;

        let mut right_rows: FxHashMap<ValueKey, Vec<usize>> = FxHashMap::default();
        for (i, value) in right_key.iter().enumerate() {
            if !value.is_null() {
                right_rows.entry(ValueKey::from(&value)).or_default().push(i);
            }
        }

        let mut left_idx = Vec::new();
        let mut right_idx = Vec::new();
        for (i, value) in left_key.iter().enumerate() {
            if let Some(matches) = right_rows.get(&ValueKey::from(&value)) {
                for &j in matches {
                    left_idx.push(i);
                    right_idx.push(j);
                }
            }
        }

        let mut out = self.take(&left_idx);
        let right = other.take(&right_idx);
        for (name, _) in other.column_types() {
            if name == on {
                continue;
            }
            let target = if out.has_column(&name) {
                format!("{}.1", name)
            } else {
                name.clone()
            };
            out.add_column(target, right.column(&name)?.clone())?;
        }
        Ok(out)
    }

    /// Group rows by the `keys` columns and compute one output column per
    /// `(output_name, aggregate)`. Groups appear in first-seen order.
    pub fn groupby(&self, keys: &[&str], aggregates: &[(&str, Aggregate)]) -> TableResult<Table> {
        let key_cols: Vec<&Column> = keys.iter().map(|k| self.column(k)).collect::<TableResult<_>>()?;

        let mut inputs: Vec<Option<&Column>> = Vec::with_capacity(aggregates.len());
        let mut outputs: Vec<ColumnType> = Vec::with_capacity(aggregates.len());
        for (_, agg) in aggregates {
            let input = match agg.input() {
                Some(name) => {
                    let col = self.column(name)?;
                    if !matches!(col.column_type(), ColumnType::Integer | ColumnType::Float) {
                        return Err(TableError::TypeMismatch {
                            column: name.to_string(),
                            expected: ColumnType::Float,
                            found: col.column_type().name().to_string(),
                        });
                    }
                    Some(col)
                }
                None => None,
            };
            outputs.push(agg.output_type(input.map(Column::column_type)));
            inputs.push(input);
        }

        let mut groups: IndexMap<Vec<ValueKey>, Vec<Accumulator>> = IndexMap::new();
        for row in 0..self.num_rows() {
            let key: Vec<ValueKey> = key_cols.iter().map(|c| ValueKey::from(&c.get(row))).collect();
            let accs = groups
                .entry(key)
                .or_insert_with(|| aggregates.iter().map(|(_, a)| Accumulator::new(a)).collect());
            for (acc, input) in accs.iter_mut().zip(&inputs) {
                acc.update(input.and_then(|c| c.get(row).as_float()));
            }
        }

        let mut out_keys: Vec<Column> = key_cols.iter().map(|c| Column::new(c.column_type())).collect();
        let mut out_aggs: Vec<Column> = outputs.iter().map(|ty| Column::new(*ty)).collect();
        for (key, accs) in groups {
            for (col, k) in out_keys.iter_mut().zip(key) {
                col.push(Value::from(k))?;
            }
            for ((col, acc), ty) in out_aggs.iter_mut().zip(&accs).zip(&outputs) {
                col.push(acc.finish(*ty))?;
            }
        }

        let mut out = Table::new();
        for (name, col) in keys.iter().zip(out_keys) {
            out.add_column(*name, col)?;
        }
        for ((name, _), col) in aggregates.iter().zip(out_aggs) {
            out.add_column(*name, col)?;
        }
        Ok(out)
    }
}
