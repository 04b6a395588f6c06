//! Gzip-compressed bincode snapshots of a materialized graph

use crate::graph::{Graph, GraphData, GraphError, GraphResult, GraphSchema};
use crate::table::Table;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    schema: GraphSchema,
    vertices: Table,
    edges: Table,
}

impl Graph {
    /// Materialize and write the graph to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> GraphResult<()> {
        let path = path.as_ref();
        let data = self.data()?;
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            schema: self.schema(),
            vertices: data.vertices().clone(),
            edges: data.edges().clone(),
        };

        let mut encoder = GzEncoder::new(BufWriter::new(File::create(path)?), Compression::default());
        bincode::serialize_into(&mut encoder, &snapshot)?;
        encoder.finish()?.flush()?;
        info!(
            "Saved snapshot to {:?}: {} vertices, {} edges",
            path,
            data.num_vertices(),
            data.num_edges()
        );
        Ok(())
    }

    /// Read a snapshot written by [`Graph::save`] as a new materialized graph
    pub fn load(path: impl AsRef<Path>) -> GraphResult<Graph> {
        let path = path.as_ref();
        let decoder = GzDecoder::new(BufReader::new(File::open(path)?));
        let snapshot: Snapshot = bincode::deserialize_from(decoder)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GraphError::Schema(format!(
                "snapshot {:?} has version {}, expected {}",
                path, snapshot.version, SNAPSHOT_VERSION
            )));
        }
        let data = GraphData::new(snapshot.vertices, snapshot.edges);
        info!(
            "Loaded snapshot from {:?}: {} vertices, {} edges",
            path,
            data.num_vertices(),
            data.num_edges()
        );
        Ok(Graph::from_data(data, snapshot.schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, Value};
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.snap");

        let edges = Table::from_columns(vec![
            ("src", Column::Int(vec![Some(1), Some(1)])),
            ("dst", Column::Int(vec![Some(2), Some(2)])),
            ("label", Column::String(vec![Some("a".to_string()), None])),
        ])
        .unwrap();
        let g = Graph::construct(Table::new(), edges, "id", "src", "dst").unwrap();
        g.add_vertex_field("score", Value::Float(0.5)).unwrap();
        g.save(&path).unwrap();

        let loaded = Graph::load(&path).unwrap();
        assert!(loaded.is_materialized());
        assert_eq!(loaded.schema(), g.schema());
        assert_eq!(loaded.get_edges(&[], &[]).unwrap(), g.get_edges(&[], &[]).unwrap());
        assert_eq!(loaded.get_vertices(&[], &[]).unwrap(), g.get_vertices(&[], &[]).unwrap());
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(Graph::load(dir.path().join("missing")), Err(GraphError::Io(_))));

        let garbage = dir.path().join("garbage");
        std::fs::write(&garbage, b"not a snapshot").unwrap();
        assert!(Graph::load(&garbage).is_err());
    }
}
