//! Per-vertex locks for triple-apply

use crate::table::Value;
use parking_lot::{Mutex, MutexGuard};

/// Order in which the endpoint locks of an edge are acquired.
///
/// Lower dense index first, whichever endpoint is the source. Every worker
/// agrees on this total order, so no cycle of waiters can form.
pub fn lock_order(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Vertex attribute rows addressed by dense index, one lock per vertex
pub(crate) struct VertexLocks {
    rows: Vec<Mutex<Vec<Value>>>,
}

/// Guards held while one edge is processed
pub(crate) enum EndpointGuards<'a> {
    /// Self-loop: source and target share the row
    Single(MutexGuard<'a, Vec<Value>>),
    Pair {
        source: MutexGuard<'a, Vec<Value>>,
        target: MutexGuard<'a, Vec<Value>>,
    },
}

impl VertexLocks {
    pub(crate) fn new(rows: Vec<Vec<Value>>) -> Self {
        VertexLocks {
            rows: rows.into_iter().map(Mutex::new).collect(),
        }
    }

    /// Lock both endpoints of an edge in canonical order
    pub(crate) fn lock_edge(&self, source: usize, target: usize) -> EndpointGuards<'_> {
        if source == target {
            return EndpointGuards::Single(self.rows[source].lock());
        }
        let (first, second) = lock_order(source, target);
        let first_guard = self.rows[first].lock();
        let second_guard = self.rows[second].lock();
        if first == source {
            EndpointGuards::Pair {
                source: first_guard,
                target: second_guard,
            }
        } else {
            EndpointGuards::Pair {
                source: second_guard,
                target: first_guard,
            }
        }
    }

    pub(crate) fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows.into_iter().map(Mutex::into_inner).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_order_is_symmetric() {
        assert_eq!(lock_order(3, 7), (3, 7));
        assert_eq!(lock_order(7, 3), (3, 7));
        assert_eq!(lock_order(4, 4), (4, 4));
    }

    #[test]
    fn test_guards_map_to_endpoints() {
        let locks = VertexLocks::new(vec![vec![Value::from(0)], vec![Value::from(1)]]);
        match locks.lock_edge(1, 0) {
            EndpointGuards::Pair { source, target } => {
                assert_eq!(source[0], Value::from(1));
                assert_eq!(target[0], Value::from(0));
            }
            EndpointGuards::Single(_) => panic!("expected two guards"),
        }
        assert!(matches!(locks.lock_edge(1, 1), EndpointGuards::Single(_)));
        assert_eq!(locks.into_rows().len(), 2);
    }
}
