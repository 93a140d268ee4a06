//! agentgraph graph - property graph store boundary and in-memory backend

pub mod error;
pub mod handle;
pub mod memory;
pub mod store;

pub use error::{GraphError, GraphResult};
pub use handle::GraphHandle;
pub use memory::MemoryGraph;
pub use store::{Edge, EdgeId, GraphState, GraphStore, GraphTransaction, Node, NodeId, Properties};
