//! Triple-apply configuration

use serde::{Deserialize, Serialize};

/// Worker pool sizing for [`Graph::triple_apply_with_config`](crate::Graph::triple_apply_with_config)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripleApplyConfig {
    /// Worker threads; `None` uses the available hardware parallelism
    pub num_workers: Option<usize>,
    /// Smallest edge partition handed to one task
    pub min_edges_per_task: usize,
}

impl Default for TripleApplyConfig {
    fn default() -> Self {
        Self {
            num_workers: None,
            min_edges_per_task: 1024,
        }
    }
}

impl TripleApplyConfig {
    /// Config with a fixed worker count
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers: Some(num_workers),
            ..Self::default()
        }
    }

    /// Parse overrides from JSON; absent keys keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn worker_count(&self) -> usize {
        match self.num_workers {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }

    /// Edges per task so that every worker gets a few partitions
    pub(crate) fn chunk_size(&self, num_edges: usize) -> usize {
        let per_worker = num_edges.div_ceil(self.worker_count() * 4);
        per_worker.max(self.min_edges_per_task).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_json_overrides() {
        let config = TripleApplyConfig::default();
        assert_eq!(config.min_edges_per_task, 1024);
        assert!(config.worker_count() >= 1);

        let parsed = TripleApplyConfig::from_json(r#"{"num_workers": 3}"#).unwrap();
        assert_eq!(parsed.num_workers, Some(3));
        assert_eq!(parsed.min_edges_per_task, 1024);
        assert!(TripleApplyConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_chunk_size() {
        let config = TripleApplyConfig {
            num_workers: Some(2),
            min_edges_per_task: 1,
        };
        assert_eq!(config.chunk_size(80), 10);
        assert_eq!(config.chunk_size(0), 1);
        assert_eq!(TripleApplyConfig::with_workers(2).chunk_size(80), 1024);
    }
}
