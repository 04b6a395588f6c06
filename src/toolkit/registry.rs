//! Name-addressable toolkit registry
//!
//! Toolkits are registered by ordinary calls; nothing is collected from
//! global state. Each entry declares the argument names it accepts so that
//! callers get an error for misspelled arguments instead of silent defaults.

use super::{components, degree, pagerank, Params};
use crate::graph::{Graph, GraphError, GraphResult};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Toolkit entry point
pub type ToolkitFn = Arc<dyn Fn(&Graph, &Params) -> GraphResult<Graph> + Send + Sync>;

#[derive(Clone)]
struct ToolkitEntry {
    arguments: Vec<String>,
    run: ToolkitFn,
}

/// Mapping from toolkit name to its declared arguments and function
#[derive(Clone, Default)]
pub struct ToolkitRegistry {
    entries: IndexMap<String, ToolkitEntry>,
}

impl ToolkitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `degree_count`, `pagerank` and `connected_components`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("degree_count", &[], |graph, _| degree::degree_count(graph));
        registry.register("pagerank", &pagerank::PageRankConfig::ARGUMENTS, |graph, params| {
            let config = pagerank::PageRankConfig::from_params(params)?;
            pagerank::pagerank(graph, &config)
        });
        registry.register("connected_components", &[], |graph, _| {
            components::connected_components(graph)
        });
        registry
    }

    /// Add or replace a toolkit
    pub fn register<F>(&mut self, name: &str, arguments: &[&str], run: F)
    where
        F: Fn(&Graph, &Params) -> GraphResult<Graph> + Send + Sync + 'static,
    {
        let entry = ToolkitEntry {
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            run: Arc::new(run),
        };
        self.entries.insert(name.to_string(), entry);
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn arguments(&self, name: &str) -> GraphResult<&[String]> {
        self.entry(name).map(|e| e.arguments.as_slice())
    }

    /// Run a toolkit after checking `params` against its declared arguments
    pub fn run(&self, name: &str, graph: &Graph, params: &Params) -> GraphResult<Graph> {
        let entry = self.entry(name)?;
        if let Some(unknown) = params.keys().find(|k| !entry.arguments.contains(*k)) {
            return Err(GraphError::InvalidArgument {
                toolkit: name.to_string(),
                message: format!("unknown argument '{}'", unknown),
            });
        }
        info!("Running toolkit {}", name);
        (entry.run)(graph, params)
    }

    fn entry(&self, name: &str) -> GraphResult<&ToolkitEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| GraphError::UnknownToolkit(name.to_string()))
    }
}

impl fmt::Debug for ToolkitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, e)| (name, &e.arguments)))
            .finish()
    }
}
