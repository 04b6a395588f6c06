use samyama_sgraph::toolkit::{COMPONENT_ID, PAGERANK};
use samyama_sgraph::{
    Column, ColumnExpr, ColumnType, EdgeSpec, Graph, Params, Table, ToolkitRegistry, Value, VID_COLUMN,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Samyama SGraph v{}", samyama_sgraph::version());
    println!("==========================================");
    println!();

    let graph = demo_structure()?;
    demo_overlay(&graph)?;
    demo_selection(&graph)?;
    demo_toolkits(&graph)?;
    demo_snapshot(&graph)?;
    Ok(())
}

fn demo_structure() -> anyhow::Result<Graph> {
    println!("=== Demo 1: Lazy Structure ===");
    let people = Table::from_columns(vec![
        ("name", Column::String(["alice", "bob", "carol", "dave"].iter().map(|s| Some(s.to_string())).collect())),
        ("age", Column::Int(vec![Some(30), Some(25), Some(35), Some(41)])),
    ])?;
    let follows = Table::from_columns(vec![
        ("from", Column::String(["alice", "bob", "carol", "dave"].iter().map(|s| Some(s.to_string())).collect())),
        ("to", Column::String(["bob", "carol", "alice", "alice"].iter().map(|s| Some(s.to_string())).collect())),
    ])?;
    let graph = Graph::construct(people, follows, "name", "from", "to")?;

    // Nothing is evaluated until a count is requested
    let extended = graph.add_edges(
        Table::from_columns(vec![
            ("from", Column::String(vec![Some("erin".to_string())])),
            ("to", Column::String(vec![Some("dave".to_string())])),
        ])?,
        "from",
        "to",
    )?;
    println!("✓ Extended graph materialized: {}", extended.is_materialized());
    let summary = extended.summary()?;
    println!("✓ {} vertices, {} edges", summary.num_vertices, summary.num_edges);
    println!("✓ Original still has {} vertices", graph.vertex_count()?);
    Ok(extended)
}

fn demo_overlay(graph: &Graph) -> anyhow::Result<()> {
    println!("\n=== Demo 2: Overlay Views ===");
    let vertices = graph.vertices();
    vertices.add_column(
        "senior",
        ColumnExpr::map(ColumnType::Boolean, |row| {
            Ok(Value::from(row.get("age").and_then(|v| v.as_integer()).unwrap_or(0) >= 35))
        }),
    )?;
    println!("✓ Vertex fields: {:?}", graph.vertex_fields());

    let detached = vertices.filter(|row| row.get("senior") == Some(Value::Boolean(true)))?;
    println!("✓ Detached selection of seniors: {} rows", detached.num_rows());
    Ok(())
}

fn demo_selection(graph: &Graph) -> anyhow::Result<()> {
    println!("\n=== Demo 3: Selection ===");
    let into_alice = graph.get_edges(&[EdgeSpec::into_vertex("alice")], &[])?;
    println!("✓ Edges into alice: {}", into_alice.num_rows());
    let seniors = graph.get_vertices(&[], &[("senior", Value::Boolean(true))])?;
    for row in seniors.rows() {
        println!("  - {}", row.get(VID_COLUMN).unwrap_or_default());
    }
    Ok(())
}

fn demo_toolkits(graph: &Graph) -> anyhow::Result<()> {
    println!("\n=== Demo 4: Toolkits ===");
    let registry = ToolkitRegistry::with_defaults();
    println!("✓ Registered toolkits: {:?}", registry.names());

    let ranked = registry.run("pagerank", graph, &Params::new())?;
    let table = ranked.vertices().select_columns(&[VID_COLUMN, PAGERANK])?;
    for row in table.rows() {
        println!(
            "  {:>6}  {:.4}",
            row.get(VID_COLUMN).unwrap_or_default(),
            row.get(PAGERANK).and_then(|v| v.as_float()).unwrap_or(0.0)
        );
    }

    let components = registry.run("connected_components", graph, &Params::new())?;
    let groups = components.vertices().groupby(&[COMPONENT_ID], &[("size", samyama_sgraph::Aggregate::Count)])?;
    println!("✓ {} connected component(s)", groups.num_rows());
    Ok(())
}

fn demo_snapshot(graph: &Graph) -> anyhow::Result<()> {
    println!("\n=== Demo 5: Snapshot ===");
    let path = std::env::temp_dir().join(format!("samyama-sgraph-demo-{}.snap", std::process::id()));
    graph.save(&path)?;
    let restored = Graph::load(&path)?;
    info!("Restored snapshot from {:?}", path);
    println!("✓ Restored {} vertices from {}", restored.vertex_count()?, path.display());
    std::fs::remove_file(&path)?;
    Ok(())
}
