use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use samyama_sgraph::{pagerank, Column, Graph, PageRankConfig, Table, TripleApplyConfig, Value};

/// Random graph with `n` vertices and `m` edges
fn random_graph(n: i64, m: usize) -> Graph {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let src: Vec<Option<i64>> = (0..m).map(|_| Some(rng.gen_range(0..n))).collect();
    let dst: Vec<Option<i64>> = (0..m).map(|_| Some(rng.gen_range(0..n))).collect();
    let vertices = Table::from_columns(vec![("id", Column::Int((0..n).map(Some).collect()))]).unwrap();
    let edges = Table::from_columns(vec![("src", Column::Int(src)), ("dst", Column::Int(dst))]).unwrap();
    let graph = Graph::construct(vertices, edges, "id", "src", "dst").unwrap();
    graph.vertices().add_column("acc", Value::Float(0.0)).unwrap();
    graph.materialize().unwrap();
    graph
}

/// Benchmark accumulation throughput across worker counts
fn bench_triple_apply_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("triple_apply_workers");
    let graph = random_graph(10_000, 100_000);

    for workers in [1usize, 2, 4, 8].iter() {
        let config = TripleApplyConfig::with_workers(*workers);
        group.bench_with_input(BenchmarkId::from_parameter(workers), workers, |b, _| {
            b.iter(|| {
                graph
                    .triple_apply_with_config(
                        |t| {
                            let acc = t.target.get_float("acc").unwrap_or(0.0);
                            t.target.set("acc", acc + 1.0);
                            Ok(())
                        },
                        &["acc"],
                        &config,
                    )
                    .unwrap()
            });
        });
    }
    group.finish();
}

/// Benchmark a full pagerank run by graph size
fn bench_pagerank(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagerank");
    group.sample_size(10);

    for size in [1_000i64, 10_000].iter() {
        let graph = random_graph(*size, (*size as usize) * 10);
        let config = PageRankConfig {
            max_iterations: 5,
            ..PageRankConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| pagerank(&graph, &config).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_triple_apply_workers, bench_pagerank);
criterion_main!(benches);
