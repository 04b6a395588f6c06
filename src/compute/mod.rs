//! Triple-apply: user-defined parallel computation over graph edges
//!
//! Every edge is presented to a callback as a [`Triple`] of records (source
//! vertex, edge, target vertex). Edges are split into disjoint partitions and
//! processed on a dedicated worker pool. Vertex rows live behind one lock per
//! vertex, addressed by the dense index of [`VertexIndex`](crate::graph::VertexIndex);
//! the two endpoint locks of an edge are always taken in [`lock_order`].
//!
//! The callback declares up front which fields it mutates. Only declared
//! fields the callback actually wrote are copied back; a write to anything
//! else fails the run with [`GraphError::UndeclaredMutation`](crate::graph::GraphError).

pub mod config;
pub(crate) mod locks;
pub mod triple;
mod triple_apply;

pub use config::TripleApplyConfig;
pub use locks::lock_order;
pub use triple::{Record, Triple};
