//! Shared, cloneable access to a graph store.
//!
//! This is the handle passed to agents at construction time and bound into
//! scripts. Reads never fail loudly: a poisoned store reads as empty.

use crate::error::GraphResult;
use crate::memory::MemoryGraph;
use crate::store::{GraphState, GraphStore, GraphTransaction, Node};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct GraphHandle {
    store: Arc<dyn GraphStore>,
}

impl std::fmt::Debug for GraphHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphHandle").finish_non_exhaustive()
    }
}

impl GraphHandle {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// A handle over a fresh in-memory graph.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryGraph::new()))
    }

    pub fn begin(&self) -> GraphResult<Box<dyn GraphTransaction + '_>> {
        self.store.begin()
    }

    pub fn snapshot(&self) -> GraphResult<GraphState> {
        self.store.snapshot()
    }

    fn read(&self) -> GraphState {
        self.store.snapshot().unwrap_or_else(|e| {
            warn!(error = %e, "graph snapshot failed");
            GraphState::default()
        })
    }

    pub fn node_count(&self) -> usize {
        self.read().node_count()
    }

    pub fn has_node(&self, name: &str) -> bool {
        !self.find_by_name(name).is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Vec<Node> {
        let state = self.read();
        let wanted = Value::String(name.to_string());
        state
            .find_nodes(None, "name", &wanted)
            .into_iter()
            .filter_map(|id| state.node(id).cloned())
            .collect()
    }

    pub fn nodes_with_label(&self, label: &str) -> Vec<Node> {
        self.read().nodes_with_label(label).cloned().collect()
    }
}

impl From<Arc<dyn GraphStore>> for GraphHandle {
    fn from(store: Arc<dyn GraphStore>) -> Self {
        Self::new(store)
    }
}
