//! Graph analytics toolkits built on triple-apply
//!
//! Each toolkit takes a graph and returns a new graph with its results as
//! vertex fields; the input is never modified.

pub mod components;
pub mod degree;
pub mod pagerank;
pub mod registry;

use crate::table::Value;
use indexmap::IndexMap;

/// Named toolkit arguments
pub type Params = IndexMap<String, Value>;

pub use components::{connected_components, COMPONENT_ID};
pub use degree::{degree_count, IN_DEGREE, OUT_DEGREE, TOTAL_DEGREE};
pub use pagerank::{pagerank, PageRankConfig, DELTA, PAGERANK};
pub use registry::{ToolkitFn, ToolkitRegistry};
