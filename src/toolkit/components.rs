//! Weakly connected components by label propagation

use crate::graph::{Graph, GraphResult};
use crate::table::{ColumnExpr, ColumnType, Value};
use tracing::{debug, info};

pub const COMPONENT_ID: &str = "component_id";

/// New graph with a `component_id` vertex field.
///
/// Every vertex starts labelled with its dense index; each pass pushes the
/// smaller label of an edge's endpoints onto the other endpoint until a pass
/// changes nothing. The final label is the smallest dense index in the
/// component, which is the storage position of its first vertex.
pub fn connected_components(graph: &Graph) -> GraphResult<Graph> {
    // labels go on a separate instance so the caller's graph keeps its fields
    let seeded = graph.clone();
    seeded.vertices().assign_column(
        COMPONENT_ID,
        ColumnExpr::map(ColumnType::Integer, |row| Ok(Value::Integer(row.index() as i64))),
    )?;

    let mut labels = component_labels(&seeded)?;
    let mut current = seeded;
    let mut passes = 0;
    loop {
        passes += 1;
        let next = current.triple_apply(
            |t| {
                let source = t.source.get_integer(COMPONENT_ID).unwrap_or(i64::MAX);
                let target = t.target.get_integer(COMPONENT_ID).unwrap_or(i64::MAX);
                if source < target {
                    t.target.set(COMPONENT_ID, source);
                } else if target < source {
                    t.source.set(COMPONENT_ID, target);
                }
                Ok(())
            },
            &[COMPONENT_ID],
        )?;
        let next_labels = component_labels(&next)?;
        current = next;
        let changed = next_labels != labels;
        debug!("connected_components pass {}: changed = {}", passes, changed);
        if !changed {
            break;
        }
        labels = next_labels;
    }
    info!("connected_components converged after {} passes", passes);
    Ok(current)
}

fn component_labels(graph: &Graph) -> GraphResult<Vec<Value>> {
    Ok(graph.vertices().to_table()?.column(COMPONENT_ID)?.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, Table};

    #[test]
    fn test_two_components() {
        let vertices = Table::from_columns(vec![("id", Column::Int((1..=7).map(Some).collect()))]).unwrap();
        // 1-2-3 chain (against edge direction in places), 4 <- 5 and 6 -> 4, 7 isolated
        let edges = Table::from_columns(vec![
            ("src", Column::Int(vec![Some(3), Some(2), Some(5), Some(6)])),
            ("dst", Column::Int(vec![Some(2), Some(1), Some(4), Some(4)])),
        ])
        .unwrap();
        let g = Graph::construct(vertices, edges, "id", "src", "dst").unwrap();
        let out = connected_components(&g).unwrap();
        let labels: Vec<i64> = component_labels(&out)
            .unwrap()
            .iter()
            .map(|v| v.as_integer().unwrap())
            .collect();
        assert_eq!(labels, vec![0, 0, 0, 3, 3, 3, 6]);
        assert!(!g.vertex_fields().contains(&COMPONENT_ID.to_string()));
    }
}
