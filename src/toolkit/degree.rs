//! Vertex degree counting

use crate::graph::{Graph, GraphResult};
use crate::table::{ColumnExpr, ColumnType, Value};

pub const IN_DEGREE: &str = "in_degree";
pub const OUT_DEGREE: &str = "out_degree";
pub const TOTAL_DEGREE: &str = "total_degree";

/// New graph with `in_degree`, `out_degree` and `total_degree` vertex fields.
///
/// A self-loop counts once towards each of in and out degree.
pub fn degree_count(graph: &Graph) -> GraphResult<Graph> {
    let counted = count_out_in(graph, OUT_DEGREE, Some(IN_DEGREE))?;
    counted.vertices().assign_column(
        TOTAL_DEGREE,
        ColumnExpr::map(ColumnType::Integer, |row| {
            let degree = |name: &str| row.get(name).and_then(|v| v.as_integer()).unwrap_or(0);
            Ok(Value::Integer(degree(IN_DEGREE) + degree(OUT_DEGREE)))
        }),
    )?;
    Ok(counted)
}

/// Count out-edges (and optionally in-edges) into integer vertex fields
pub(crate) fn count_out_in(graph: &Graph, out_field: &str, in_field: Option<&str>) -> GraphResult<Graph> {
    let working = graph.clone();
    let view = working.vertices();
    view.assign_column(out_field, Value::Integer(0))?;
    let mut mutated = vec![out_field];
    if let Some(in_field) = in_field {
        view.assign_column(in_field, Value::Integer(0))?;
        mutated.push(in_field);
    }
    working.triple_apply(
        |t| {
            let out = t.source.get_integer(out_field).unwrap_or(0);
            t.source.set(out_field, out + 1);
            if let Some(in_field) = in_field {
                let incoming = t.target.get_integer(in_field).unwrap_or(0);
                t.target.set(in_field, incoming + 1);
            }
            Ok(())
        },
        &mutated,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, Table};

    #[test]
    fn test_degrees() {
        let edges = Table::from_columns(vec![
            ("src", Column::Int(vec![Some(1), Some(1), Some(2), Some(3)])),
            ("dst", Column::Int(vec![Some(2), Some(3), Some(3), Some(3)])),
        ])
        .unwrap();
        let g = Graph::construct(Table::new(), edges, "id", "src", "dst").unwrap();
        let out = degree_count(&g).unwrap();
        let table = out.get_vertices(&[], &[]).unwrap();
        let col = |name: &str| -> Vec<i64> {
            table.column(name).unwrap().iter().map(|v| v.as_integer().unwrap()).collect()
        };
        assert_eq!(col(OUT_DEGREE), vec![2, 1, 1]);
        assert_eq!(col(IN_DEGREE), vec![0, 1, 3]);
        assert_eq!(col(TOTAL_DEGREE), vec![2, 2, 4]);
        // input graph is left alone
        assert!(!g.vertex_fields().contains(&OUT_DEGREE.to_string()));
    }
}
