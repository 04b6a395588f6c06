//! Materialized graph data and its adjacency index
//!
//! The index maps every vertex identity to a dense position `0..N` and lays
//! edges out in Compressed Sparse Row form in both directions. It is built on
//! first use and cached on the materialized data it describes.

use super::error::{GraphError, GraphResult};
use super::{DST_COLUMN, SRC_COLUMN, VID_COLUMN};
use crate::table::{Table, Value, ValueKey};
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Concrete vertex and edge tables of one materialized graph node
///
/// Tables are shared, so an operation that touches one side reuses the other.
#[derive(Debug, Default)]
pub struct GraphData {
    pub(crate) vertices: Arc<Table>,
    pub(crate) edges: Arc<Table>,
    index: OnceLock<VertexIndex>,
}

impl GraphData {
    pub fn new(vertices: Table, edges: Table) -> Self {
        Self::from_shared(Arc::new(vertices), Arc::new(edges))
    }

    pub(crate) fn from_shared(vertices: Arc<Table>, edges: Arc<Table>) -> Self {
        GraphData {
            vertices,
            edges,
            index: OnceLock::new(),
        }
    }

    pub fn vertices(&self) -> &Table {
        &self.vertices
    }

    pub fn edges(&self) -> &Table {
        &self.edges
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.num_rows()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.num_rows()
    }

    /// Adjacency index, built on first access
    pub fn index(&self) -> GraphResult<&VertexIndex> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }
        let built = VertexIndex::build(&self.vertices, &self.edges)?;
        Ok(self.index.get_or_init(|| built))
    }
}

/// Dense vertex numbering plus CSR adjacency over edge positions
#[derive(Debug, Default)]
pub struct VertexIndex {
    ids: FxHashMap<ValueKey, usize>,
    /// Dense source index of every edge, aligned with edge table rows
    edge_src: Vec<usize>,
    /// Dense target index of every edge
    edge_dst: Vec<usize>,
    /// Offsets into `out_edges`. Size = vertex count + 1
    out_offsets: Vec<usize>,
    /// Edge positions grouped by source
    out_edges: Vec<usize>,
    /// Offsets into `in_edges`. Size = vertex count + 1
    in_offsets: Vec<usize>,
    /// Edge positions grouped by target
    in_edges: Vec<usize>,
}

impl VertexIndex {
    pub(crate) fn build(vertices: &Table, edges: &Table) -> GraphResult<Self> {
        let n = vertices.num_rows();
        let mut ids = FxHashMap::default();
        ids.reserve(n);
        if let Ok(id_col) = vertices.column(VID_COLUMN) {
            for (i, id) in id_col.iter().enumerate() {
                ids.insert(ValueKey::from(&id), i);
            }
        }

        let m = edges.num_rows();
        let mut edge_src = Vec::with_capacity(m);
        let mut edge_dst = Vec::with_capacity(m);
        if m > 0 {
            let src = edges.column(SRC_COLUMN)?;
            let dst = edges.column(DST_COLUMN)?;
            for e in 0..m {
                edge_src.push(Self::lookup(&ids, &src.get(e))?);
                edge_dst.push(Self::lookup(&ids, &dst.get(e))?);
            }
        }

        let (out_offsets, out_edges) = Self::csr(n, &edge_src);
        let (in_offsets, in_edges) = Self::csr(n, &edge_dst);
        debug!("Built vertex index: {} vertices, {} edges", n, m);

        Ok(VertexIndex {
            ids,
            edge_src,
            edge_dst,
            out_offsets,
            out_edges,
            in_offsets,
            in_edges,
        })
    }

    fn lookup(ids: &FxHashMap<ValueKey, usize>, id: &Value) -> GraphResult<usize> {
        ids.get(&ValueKey::from(id))
            .copied()
            .ok_or_else(|| GraphError::Schema(format!("edge endpoint {} has no vertex", id)))
    }

    /// Counting sort of edge positions by endpoint
    fn csr(n: usize, endpoints: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let mut offsets = vec![0usize; n + 1];
        for &v in endpoints {
            offsets[v + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }
        let mut cursor = offsets.clone();
        let mut edges = vec![0usize; endpoints.len()];
        for (e, &v) in endpoints.iter().enumerate() {
            edges[cursor[v]] = e;
            cursor[v] += 1;
        }
        (offsets, edges)
    }

    pub fn num_vertices(&self) -> usize {
        self.out_offsets.len().saturating_sub(1)
    }

    fn contains(&self, v: usize) -> bool {
        v < self.num_vertices()
    }

    /// Dense index of a vertex identity
    pub fn index_of(&self, id: &Value) -> Option<usize> {
        self.ids.get(&ValueKey::from(id)).copied()
    }

    /// Dense (source, target) of the edge at table position `edge`
    pub fn endpoints(&self, edge: usize) -> (usize, usize) {
        (self.edge_src[edge], self.edge_dst[edge])
    }

    /// Number of edges leaving `v`; zero for a position outside `0..num_vertices()`
    pub fn out_degree(&self, v: usize) -> usize {
        self.out_edges(v).len()
    }

    /// Number of edges entering `v`; zero for a position outside `0..num_vertices()`
    pub fn in_degree(&self, v: usize) -> usize {
        self.in_edges(v).len()
    }

    /// Edge positions leaving `v`
    pub fn out_edges(&self, v: usize) -> &[usize] {
        if !self.contains(v) {
            return &[];
        }
        &self.out_edges[self.out_offsets[v]..self.out_offsets[v + 1]]
    }

    /// Edge positions entering `v`
    pub fn in_edges(&self, v: usize) -> &[usize] {
        if !self.contains(v) {
            return &[];
        }
        &self.in_edges[self.in_offsets[v]..self.in_offsets[v + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn data() -> GraphData {
        let vertices = Table::from_columns(vec![(VID_COLUMN, Column::Int(vec![Some(10), Some(20), Some(30)]))]).unwrap();
        let edges = Table::from_columns(vec![
            (SRC_COLUMN, Column::Int(vec![Some(10), Some(10), Some(30)])),
            (DST_COLUMN, Column::Int(vec![Some(20), Some(30), Some(10)])),
        ])
        .unwrap();
        GraphData::new(vertices, edges)
    }

    #[test]
    fn test_degrees_and_adjacency() {
        let data = data();
        let index = data.index().unwrap();
        assert_eq!(index.num_vertices(), 3);
        let a = index.index_of(&Value::from(10)).unwrap();
        let c = index.index_of(&Value::from(30)).unwrap();
        assert_eq!(index.out_degree(a), 2);
        assert_eq!(index.in_degree(a), 1);
        assert_eq!(index.out_edges(a), &[0, 1]);
        assert_eq!(index.in_edges(a), &[2]);
        assert_eq!(index.endpoints(2), (c, a));
        assert_eq!(index.index_of(&Value::from(99)), None);
    }

    #[test]
    fn test_out_of_range_vertex_has_no_edges() {
        let data = data();
        let index = data.index().unwrap();
        assert_eq!(index.out_degree(3), 0);
        assert_eq!(index.in_degree(usize::MAX), 0);
        assert!(index.out_edges(7).is_empty());
        assert!(index.in_edges(3).is_empty());
    }

    #[test]
    fn test_index_is_cached() {
        let data = data();
        let first = data.index().unwrap() as *const VertexIndex;
        let second = data.index().unwrap() as *const VertexIndex;
        assert_eq!(first, second);
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let vertices = Table::from_columns(vec![(VID_COLUMN, Column::Int(vec![Some(1)]))]).unwrap();
        let edges = Table::from_columns(vec![
            (SRC_COLUMN, Column::Int(vec![Some(1)])),
            (DST_COLUMN, Column::Int(vec![Some(2)])),
        ])
        .unwrap();
        assert!(GraphData::new(vertices, edges).index().is_err());
    }
}
