//! Parallel edge iteration with per-vertex locking

use super::config::TripleApplyConfig;
use super::locks::{EndpointGuards, VertexLocks};
use super::triple::{FieldLayout, Record, Triple};
use crate::graph::{is_reserved, ElementKind, Graph, GraphData, GraphError, GraphResult, VertexIndex};
use crate::table::{Column, ColumnType, Table, Value};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

const OP: &str = "triple_apply";

/// Shared, read-only state of one triple-apply run
struct EdgeContext<'a, F> {
    index: &'a VertexIndex,
    locks: &'a VertexLocks,
    vertex_layout: &'a FieldLayout,
    edge_layout: &'a FieldLayout,
    update: &'a F,
}

impl Graph {
    /// Run `update` on every (source, edge, target) triple in parallel and
    /// return a new graph holding the written attributes.
    ///
    /// `update` may read any field and write only the fields named in
    /// `mutated_fields`. See [`Graph::triple_apply_with_config`].
    pub fn triple_apply<F>(&self, update: F, mutated_fields: &[&str]) -> GraphResult<Graph>
    where
        F: Fn(&mut Triple<'_>) -> anyhow::Result<()> + Send + Sync,
    {
        self.triple_apply_with_config(update, mutated_fields, &TripleApplyConfig::default())
    }

    /// Triple-apply on an explicitly sized worker pool.
    ///
    /// Both endpoint vertices are locked for the duration of each callback,
    /// so a read-modify-write of a vertex field is serialized across all
    /// edges touching that vertex. Visitation order is unspecified: callers
    /// accumulating into shared vertex fields must use commutative updates.
    ///
    /// Failure is not atomic across edges. Work runs against a private copy
    /// of the attribute tables, so on error `self` is untouched and no
    /// partially updated graph is returned, but the edges processed before
    /// the failure are simply discarded.
    pub fn triple_apply_with_config<F>(
        &self,
        update: F,
        mutated_fields: &[&str],
        config: &TripleApplyConfig,
    ) -> GraphResult<Graph>
    where
        F: Fn(&mut Triple<'_>) -> anyhow::Result<()> + Send + Sync,
    {
        let schema = self.schema();
        let mut declared = Vec::with_capacity(mutated_fields.len());
        for name in mutated_fields {
            if is_reserved(name) {
                return Err(GraphError::reserved(OP, name));
            }
            if !schema.vertex_attrs.contains_key(*name) && !schema.edge_attrs.contains_key(*name) {
                return Err(GraphError::no_such_column(OP, name));
            }
            declared.push(name.to_string());
        }

        let data = self.data()?;
        let index = data.index()?;
        let vertex_layout = FieldLayout::new(ElementKind::Vertex, data.vertices(), &declared);
        let edge_layout = FieldLayout::new(ElementKind::Edge, data.edges(), &declared);
        let locks = VertexLocks::new(data.vertices().to_rows());
        let mut edge_rows = data.edges().to_rows();

        let start = Instant::now();
        let workers = config.worker_count();
        info!(
            "Starting triple_apply over {} edges, {} vertices, mutating {:?}",
            edge_rows.len(),
            data.num_vertices(),
            declared
        );

        if !edge_rows.is_empty() {
            let chunk = config.chunk_size(edge_rows.len());
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("triple-apply-{}", i))
                .build()
                .map_err(|e| GraphError::Compute(format!("{}: cannot start worker pool: {}", OP, e)))?;
            debug!("triple_apply pool: {} workers, {} edges per task", workers, chunk);

            let ctx = EdgeContext {
                index,
                locks: &locks,
                vertex_layout: &vertex_layout,
                edge_layout: &edge_layout,
                update: &update,
            };
            pool.install(|| {
                edge_rows
                    .par_chunks_mut(chunk)
                    .enumerate()
                    .try_for_each(|(task, rows)| {
                        let offset = task * chunk;
                        for (i, row) in rows.iter_mut().enumerate() {
                            apply_edge(&ctx, offset + i, row)?;
                        }
                        Ok::<(), GraphError>(())
                    })
            })?;
        }

        let vertex_rows = locks.into_rows();
        let vertices = rebuild(data.vertices(), &vertex_layout, &vertex_rows)?;
        let edges = rebuild(data.edges(), &edge_layout, &edge_rows)?;
        info!("triple_apply finished in {:?}", start.elapsed());
        Ok(Graph::from_data(GraphData::new(vertices, edges), schema))
    }
}

fn apply_edge<F>(ctx: &EdgeContext<'_, F>, edge: usize, row: &mut [Value]) -> GraphResult<()>
where
    F: Fn(&mut Triple<'_>) -> anyhow::Result<()>,
{
    let (source, target) = ctx.index.endpoints(edge);
    let mut guards = ctx.locks.lock_edge(source, target);

    let (source_writes, edge_writes, target_writes) = {
        let (source_row, target_row) = match &guards {
            EndpointGuards::Single(shared) => (shared.as_slice(), shared.as_slice()),
            EndpointGuards::Pair { source, target } => (source.as_slice(), target.as_slice()),
        };
        let mut triple = Triple {
            source: Record::new(ctx.vertex_layout, source_row),
            edge: Record::new(ctx.edge_layout, row),
            target: Record::new(ctx.vertex_layout, target_row),
        };
        (ctx.update)(&mut triple).map_err(|err| {
            GraphError::Compute(format!(
                "{}: update failed on edge {} ({} -> {}): {:#}",
                OP,
                edge,
                triple.source.id(),
                triple.target.id(),
                err
            ))
        })?;
        (
            checked(ctx.vertex_layout, triple.source)?,
            checked(ctx.edge_layout, triple.edge)?,
            checked(ctx.vertex_layout, triple.target)?,
        )
    };

    match &mut guards {
        EndpointGuards::Single(shared) => {
            write_back(shared, source_writes);
            write_back(shared, target_writes);
        }
        EndpointGuards::Pair { source, target } => {
            write_back(source, source_writes);
            write_back(target, target_writes);
        }
    }
    write_back(row, edge_writes);
    Ok(())
}

/// Writes of `record`, type-checked against their destination columns
fn checked(layout: &FieldLayout, record: Record<'_>) -> GraphResult<Vec<(usize, Value)>> {
    let writes = record
        .into_writes()
        .map_err(|field| GraphError::UndeclaredMutation { field })?;
    writes
        .into_iter()
        .map(|(position, value)| Ok((position, coerce(layout, position, value)?)))
        .collect()
}

fn coerce(layout: &FieldLayout, position: usize, value: Value) -> GraphResult<Value> {
    let expected = layout.column_type(position);
    match ColumnType::of(&value) {
        None => Ok(value),
        Some(ty) if ty == expected => Ok(value),
        Some(ColumnType::Integer) if expected == ColumnType::Float => {
            Ok(Value::Float(value.as_float().unwrap_or_default()))
        }
        Some(_) => Err(GraphError::Compute(format!(
            "{}: {} field '{}' has type {}, cannot store {}",
            OP,
            layout.kind(),
            layout.name(position),
            expected,
            value.type_name()
        ))),
    }
}

fn write_back(row: &mut [Value], writes: Vec<(usize, Value)>) {
    for (position, value) in writes {
        row[position] = value;
    }
}

/// Copy of `table` with the declared columns replaced from `rows`
fn rebuild(table: &Table, layout: &FieldLayout, rows: &[Vec<Value>]) -> GraphResult<Table> {
    let mut out = table.clone();
    for position in layout.declared_positions() {
        let column = Column::from_values(
            layout.column_type(position),
            rows.iter().map(|row| row[position].clone()),
        )?;
        out.replace_column(layout.name(position), column)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DST_COLUMN, SRC_COLUMN, VID_COLUMN};

    fn cycle() -> Graph {
        let edges = Table::from_columns(vec![
            ("src", Column::Int(vec![Some(1), Some(2)])),
            ("dst", Column::Int(vec![Some(2), Some(1)])),
        ])
        .unwrap();
        let g = Graph::construct(Table::new(), edges, "id", "src", "dst").unwrap();
        g.add_vertex_field("value", Value::Float(1.0)).unwrap();
        g.add_vertex_field("sum", Value::Float(0.0)).unwrap();
        g.add_edge_field("seen", Value::Boolean(false)).unwrap();
        g
    }

    fn column_of(g: &Graph, name: &str) -> Vec<Value> {
        g.vertices().to_table().unwrap().column(name).unwrap().iter().collect()
    }

    #[test]
    fn test_accumulates_into_target() {
        let g = cycle();
        let out = g
            .triple_apply(
                |t| {
                    let add = t.source.get_float("value").unwrap_or(0.0);
                    let sum = t.target.get_float("sum").unwrap_or(0.0);
                    t.target.set("sum", sum + add);
                    t.edge.set("seen", true);
                    Ok(())
                },
                &["sum", "seen"],
            )
            .unwrap();
        assert_eq!(column_of(&out, "sum"), vec![Value::Float(1.0), Value::Float(1.0)]);
        let seen: Vec<Value> = out.edges().to_table().unwrap().column("seen").unwrap().iter().collect();
        assert_eq!(seen, vec![Value::Boolean(true); 2]);
        // input graph unchanged
        assert_eq!(column_of(&g, "sum"), vec![Value::Float(0.0), Value::Float(0.0)]);
    }

    #[test]
    fn test_self_loop_applies_target_after_source() {
        let edges = Table::from_columns(vec![
            (SRC_COLUMN, Column::Int(vec![Some(5)])),
            (DST_COLUMN, Column::Int(vec![Some(5)])),
        ])
        .unwrap();
        let g = Graph::new().add_edges(edges, SRC_COLUMN, DST_COLUMN).unwrap();
        g.add_vertex_field("x", Value::from(0)).unwrap();
        let out = g
            .triple_apply(
                |t| {
                    t.source.set("x", 1);
                    t.target.set("x", 2);
                    Ok(())
                },
                &["x"],
            )
            .unwrap();
        assert_eq!(column_of(&out, "x"), vec![Value::from(2)]);
        assert_eq!(column_of(&out, VID_COLUMN), vec![Value::from(5)]);
    }

    #[test]
    fn test_declaration_errors() {
        let g = cycle();
        let noop = |_: &mut Triple<'_>| -> anyhow::Result<()> { Ok(()) };
        assert!(matches!(g.triple_apply(noop, &["nope"]), Err(GraphError::NoSuchColumn { .. })));
        assert!(matches!(g.triple_apply(noop, &[VID_COLUMN]), Err(GraphError::ReservedColumn { .. })));
    }

    #[test]
    fn test_undeclared_write_fails() {
        let g = cycle();
        let result = g.triple_apply(
            |t| {
                t.target.set("value", 9.0);
                Ok(())
            },
            &["sum"],
        );
        assert!(matches!(result, Err(GraphError::UndeclaredMutation { ref field }) if field == "value"));
    }

    #[test]
    fn test_callback_error_and_type_mismatch() {
        let g = cycle();
        let failing = g.triple_apply(|_| anyhow::bail!("boom"), &["sum"]);
        match failing {
            Err(GraphError::Compute(message)) => assert!(message.contains("boom")),
            other => panic!("unexpected result: {:?}", other),
        }
        let mistyped = g.triple_apply(
            |t| {
                t.target.set("sum", "text");
                Ok(())
            },
            &["sum"],
        );
        assert!(matches!(mistyped, Err(GraphError::Compute(_))));
        // integers widen into float columns
        let widened = g.triple_apply(
            |t| {
                t.target.set("sum", 3);
                Ok(())
            },
            &["sum"],
        );
        assert_eq!(column_of(&widened.unwrap(), "sum"), vec![Value::Float(3.0); 2]);
    }
}
