use rand::Rng;
use samyama_sgraph::toolkit::{COMPONENT_ID, PAGERANK};
use samyama_sgraph::{
    connected_components, degree_count, lock_order, pagerank, Column, Graph, GraphError, PageRankConfig, Table,
    TripleApplyConfig, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};

fn graph_from_pairs(pairs: &[(i64, i64)]) -> Graph {
    let edges = Table::from_columns(vec![
        ("src", Column::Int(pairs.iter().map(|p| Some(p.0)).collect())),
        ("dst", Column::Int(pairs.iter().map(|p| Some(p.1)).collect())),
    ])
    .unwrap();
    Graph::construct(Table::new(), edges, "id", "src", "dst").unwrap()
}

fn float_column(graph: &Graph, name: &str) -> Vec<f64> {
    graph
        .get_vertices(&[], &[])
        .unwrap()
        .column(name)
        .unwrap()
        .iter()
        .map(|v| v.as_float().unwrap())
        .collect()
}

/// Every ordered pair of distinct vertices plus a self-loop on each
fn dense_pairs(n: i64) -> Vec<(i64, i64)> {
    let mut pairs = Vec::new();
    for a in 0..n {
        for b in 0..n {
            pairs.push((a, b));
        }
    }
    pairs
}

#[test]
fn test_one_pagerank_round_on_two_cycle() {
    let g = graph_from_pairs(&[(1, 2), (2, 1)]);
    g.vertices().add_column("out_degree", Value::Float(1.0)).unwrap();
    g.vertices().add_column("pagerank_prev", Value::Float(1.0)).unwrap();
    g.vertices().add_column("pagerank", Value::Float(0.15)).unwrap();

    let reset = 0.15;
    let out = g
        .triple_apply(
            |t| {
                let share = t.source.get_float("pagerank_prev").unwrap() / t.source.get_float("out_degree").unwrap();
                let rank = t.target.get_float("pagerank").unwrap();
                t.target.set("pagerank", rank + (1.0 - reset) * share);
                Ok(())
            },
            &["pagerank"],
        )
        .unwrap();
    for rank in float_column(&out, "pagerank") {
        assert!((rank - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_concurrent_accumulation_is_serialized() {
    // 30 vertices, 900 edges, 8 workers on tiny partitions
    let g = graph_from_pairs(&dense_pairs(30));
    g.vertices().add_column("hits", Value::from(0)).unwrap();
    let config = TripleApplyConfig {
        num_workers: Some(8),
        min_edges_per_task: 1,
    };
    let out = g
        .triple_apply_with_config(
            |t| {
                let hits = t.target.get_integer("hits").unwrap();
                t.target.set("hits", hits + 1);
                Ok(())
            },
            &["hits"],
            &config,
        )
        .unwrap();
    let hits = out.get_vertices(&[], &[]).unwrap();
    assert!(hits.column("hits").unwrap().iter().all(|v| v == Value::from(30)));
}

#[test]
fn test_randomized_thread_counts_terminate() {
    let mut rng = rand::thread_rng();
    let g = graph_from_pairs(&dense_pairs(12));
    g.vertices().add_column("total", Value::from(0)).unwrap();

    for _ in 0..10 {
        let config = TripleApplyConfig {
            num_workers: Some(rng.gen_range(1..=16)),
            min_edges_per_task: rng.gen_range(1..=8),
        };
        let visited = AtomicUsize::new(0);
        let out = g
            .triple_apply_with_config(
                |t| {
                    visited.fetch_add(1, Ordering::Relaxed);
                    let s = t.source.get_integer("total").unwrap();
                    t.source.set("total", s + 1);
                    let d = t.target.get_integer("total").unwrap();
                    t.target.set("total", d + 1);
                    Ok(())
                },
                &["total"],
                &config,
            )
            .unwrap();
        assert_eq!(visited.load(Ordering::Relaxed), 144);
        // every vertex is touched by 11 out-edges and 11 in-edges; its
        // self-loop counts once since the target write lands last
        let totals = out.get_vertices(&[], &[]).unwrap();
        assert!(totals.column("total").unwrap().iter().all(|v| v == Value::from(23)));
    }
}

#[test]
fn test_undeclared_mutation_leaves_graph_untouched() {
    let g = graph_from_pairs(&[(1, 2), (2, 3), (3, 1)]);
    g.vertices().add_column("a", Value::from(0)).unwrap();
    g.vertices().add_column("b", Value::from(0)).unwrap();
    let before = g.get_vertices(&[], &[]).unwrap();

    let result = g.triple_apply(
        |t| {
            t.target.set("a", 1);
            t.target.set("b", 1);
            Ok(())
        },
        &["a"],
    );
    assert!(matches!(result, Err(GraphError::UndeclaredMutation { ref field }) if field == "b"));
    assert_eq!(g.get_vertices(&[], &[]).unwrap(), before);
}

#[test]
fn test_callback_failure_aborts() {
    let g = graph_from_pairs(&dense_pairs(10));
    g.vertices().add_column("x", Value::from(0)).unwrap();
    let result = g.triple_apply_with_config(
        |t| {
            if t.source.id() == &Value::from(7) {
                anyhow::bail!("vertex 7 is cursed");
            }
            t.target.set("x", 1);
            Ok(())
        },
        &["x"],
        &TripleApplyConfig::with_workers(4),
    );
    match result {
        Err(GraphError::Compute(message)) => assert!(message.contains("cursed")),
        other => panic!("expected a compute error, got {:?}", other),
    }
    let xs = g.get_vertices(&[], &[]).unwrap();
    assert!(xs.column("x").unwrap().iter().all(|v| v == Value::from(0)));
}

#[test]
fn test_edge_fields_are_written_back() {
    let g = graph_from_pairs(&[(1, 2), (2, 3)]);
    g.vertices().add_column("weight", Value::Float(2.0)).unwrap();
    g.edges().add_column("product", Value::Float(0.0)).unwrap();
    let out = g
        .triple_apply(
            |t| {
                let w = t.source.get_float("weight").unwrap() * t.target.get_float("weight").unwrap();
                t.edge.set("product", w);
                Ok(())
            },
            &["product"],
        )
        .unwrap();
    let edges = out.get_edges(&[], &[]).unwrap();
    assert!(edges.column("product").unwrap().iter().all(|v| v == Value::Float(4.0)));
}

#[test]
fn test_lock_order_is_canonical() {
    assert_eq!(lock_order(9, 2), lock_order(2, 9));
    assert_eq!(lock_order(5, 5), (5, 5));
}

#[test]
fn test_toolkits_compose() {
    let g = graph_from_pairs(&[(1, 2), (2, 3), (3, 1), (4, 5)]);
    let degrees = degree_count(&g).unwrap();
    let totals = degrees.get_vertices(&[], &[("total_degree", Value::from(2))]).unwrap();
    assert_eq!(totals.num_rows(), 3);

    let ranked = pagerank(&degrees, &PageRankConfig::default()).unwrap();
    let ranks = float_column(&ranked, PAGERANK);
    assert!((ranks[0] - ranks[1]).abs() < 1e-9);
    assert!(degrees.vertex_fields().len() < ranked.vertex_fields().len());

    let components = connected_components(&g).unwrap();
    let labels: Vec<i64> = components
        .get_vertices(&[], &[])
        .unwrap()
        .column(COMPONENT_ID)
        .unwrap()
        .iter()
        .map(|v| v.as_integer().unwrap())
        .collect();
    assert_eq!(labels, vec![0, 0, 0, 3, 3]);
}
