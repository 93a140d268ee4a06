//! Graph store errors

use crate::store::NodeId;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("property {key:?} cannot be stored: {reason}")]
    InvalidProperty { key: String, reason: String },

    #[error("node must carry at least one label")]
    MissingLabel,

    #[error("graph store lock poisoned")]
    Poisoned,
}
