//! PageRank computed with triple-apply
//!
//! Each round resets every vertex to `reset_probability` and then, per edge,
//! adds `(1 - reset_probability) * prev(source) / out_degree(source)` to the
//! target under the vertex locks. Iteration stops after `max_iterations`
//! rounds or once the summed absolute change drops below `threshold`.

use super::degree::count_out_in;
use super::Params;
use crate::graph::{Graph, GraphError, GraphResult};
use crate::table::{ColumnExpr, ColumnType, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const PAGERANK: &str = "pagerank";
pub const DELTA: &str = "delta";

const PREVIOUS: &str = "pagerank_previous";
const OUT_EDGES: &str = "pagerank_out_edges";

/// PageRank configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Probability of jumping to a random vertex (1 - damping factor)
    pub reset_probability: f64,
    pub max_iterations: usize,
    /// Convergence bound on the summed absolute change of one round
    pub threshold: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            reset_probability: 0.15,
            max_iterations: 20,
            threshold: 1e-2,
        }
    }
}

impl PageRankConfig {
    pub(crate) const ARGUMENTS: [&'static str; 3] = ["reset_probability", "max_iterations", "threshold"];

    /// Defaults overridden by whichever arguments `params` carries
    pub fn from_params(params: &Params) -> GraphResult<Self> {
        let mut config = Self::default();
        if let Some(v) = params.get("reset_probability") {
            config.reset_probability = v.as_float().ok_or_else(|| invalid("reset_probability must be numeric"))?;
        }
        if let Some(v) = params.get("max_iterations") {
            config.max_iterations = v
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| invalid("max_iterations must be a non-negative integer"))?;
        }
        if let Some(v) = params.get("threshold") {
            config.threshold = v.as_float().ok_or_else(|| invalid("threshold must be numeric"))?;
        }
        Ok(config)
    }

    fn validate(&self) -> GraphResult<()> {
        if !(0.0..=1.0).contains(&self.reset_probability) {
            return Err(invalid("reset_probability must be within [0, 1]"));
        }
        if self.threshold < 0.0 {
            return Err(invalid("threshold must not be negative"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> GraphError {
    GraphError::InvalidArgument {
        toolkit: "pagerank".to_string(),
        message: message.to_string(),
    }
}

fn float_field(row: &crate::table::Row<'_>, name: &str) -> f64 {
    row.get(name).and_then(|v| v.as_float()).unwrap_or(0.0)
}

/// New graph with `pagerank` and `delta` vertex fields
pub fn pagerank(graph: &Graph, config: &PageRankConfig) -> GraphResult<Graph> {
    config.validate()?;
    let mut current = count_out_in(graph, OUT_EDGES, None)?;
    current.vertices().assign_column(PAGERANK, Value::Float(1.0))?;
    current.vertices().assign_column(DELTA, Value::Float(0.0))?;

    let reset = config.reset_probability;
    for iteration in 1..=config.max_iterations {
        let view = current.vertices();
        view.assign_column(
            PREVIOUS,
            ColumnExpr::map(ColumnType::Float, |row| Ok(Value::Float(float_field(row, PAGERANK)))),
        )?;
        view.assign_column(PAGERANK, Value::Float(reset))?;

        let next = current.triple_apply(
            |t| {
                let out_edges = t.source.get_integer(OUT_EDGES).unwrap_or(1).max(1) as f64;
                let share = (1.0 - reset) * t.source.get_float(PREVIOUS).unwrap_or(0.0) / out_edges;
                let rank = t.target.get_float(PAGERANK).unwrap_or(reset);
                t.target.set(PAGERANK, rank + share);
                Ok(())
            },
            &[PAGERANK],
        )?;
        next.vertices().assign_column(
            DELTA,
            ColumnExpr::map(ColumnType::Float, |row| {
                Ok(Value::Float((float_field(row, PAGERANK) - float_field(row, PREVIOUS)).abs()))
            }),
        )?;

        let total_delta: f64 = next
            .vertices()
            .to_table()?
            .column(DELTA)?
            .iter()
            .filter_map(|v| v.as_float())
            .sum();
        debug!("pagerank iteration {}: total delta {}", iteration, total_delta);
        current = next;
        if total_delta < config.threshold {
            info!("pagerank converged after {} iterations", iteration);
            break;
        }
    }

    current.vertices().remove_column(PREVIOUS).or_else(|e| match e {
        // zero iterations never created it
        GraphError::NoSuchColumn { .. } => Ok(()),
        other => Err(other),
    })?;
    current.vertices().remove_column(OUT_EDGES)?;
    Ok(current)
}
