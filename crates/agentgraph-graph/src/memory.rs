//! In-process graph backend guarded by a single mutex.

use crate::error::{GraphError, GraphResult};
use crate::store::{EdgeId, GraphState, GraphStore, GraphTransaction, NodeId, Properties};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: Mutex<GraphState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> GraphResult<MutexGuard<'_, GraphState>> {
        self.state.lock().map_err(|_| GraphError::Poisoned)
    }
}

impl GraphStore for MemoryGraph {
    fn begin(&self) -> GraphResult<Box<dyn GraphTransaction + '_>> {
        let guard = self.lock()?;
        let work = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, work }))
    }

    fn snapshot(&self) -> GraphResult<GraphState> {
        Ok(self.lock()?.clone())
    }
}

/// Holds the store lock for its lifetime and edits a private copy.
struct MemoryTransaction<'a> {
    guard: MutexGuard<'a, GraphState>,
    work: GraphState,
}

impl GraphTransaction for MemoryTransaction<'_> {
    fn create_node(&mut self, labels: &[&str], properties: Properties) -> GraphResult<NodeId> {
        let id = self.work.create_node(labels, properties)?;
        trace!(id, ?labels, "node created");
        Ok(id)
    }

    fn create_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: Properties,
    ) -> GraphResult<EdgeId> {
        let id = self.work.create_edge(from, to, rel_type, properties)?;
        trace!(id, from, to, rel_type, "edge created");
        Ok(id)
    }

    fn set_property(&mut self, id: NodeId, key: &str, value: Value) -> GraphResult<()> {
        self.work.set_property(id, key, value)
    }

    fn detach_delete_labelled(&mut self, labels: &[&str]) -> GraphResult<usize> {
        Ok(self.work.detach_delete_labelled(labels))
    }

    fn view(&self) -> &GraphState {
        &self.work
    }

    fn commit(self: Box<Self>) -> GraphResult<()> {
        let MemoryTransaction { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}
