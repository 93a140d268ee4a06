//! Agent definitions read back out of the graph.

use crate::definition::AgentDefinition;
use crate::error::AgentResult;
use agentgraph_graph::{GraphHandle, NodeId};
use serde_json::Value;
use tracing::{debug, warn};

pub const AGENT_LABEL: &str = "Agent";
pub const HAS_CAPABILITY: &str = "HAS_CAPABILITY";

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub node: NodeId,
    pub name: String,
    /// Parsed definition, or the reason the record could not be parsed.
    pub definition: Result<AgentDefinition, String>,
}

#[derive(Debug, Clone, Default)]
pub struct AgentCatalog {
    entries: Vec<CatalogEntry>,
}

impl AgentCatalog {
    /// Read every `Agent` node, reattaching capabilities from `HAS_CAPABILITY` edges.
    pub fn load(graph: &GraphHandle) -> AgentResult<Self> {
        let state = graph.snapshot()?;
        let mut entries = Vec::new();
        for node in state.nodes_with_label(AGENT_LABEL) {
            let name = node
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", node.id));

            let capabilities: Vec<Value> = state
                .edges_from(node.id, HAS_CAPABILITY)
                .filter_map(|e| state.node(e.to))
                .filter_map(|c| c.name())
                .map(|n| Value::String(n.to_string()))
                .collect();

            let mut record = node.properties.clone();
            if !capabilities.is_empty() {
                record.insert("capabilities".into(), Value::Array(capabilities));
            }

            let definition =
                AgentDefinition::from_value(&Value::Object(record)).map_err(|e| e.to_string());
            if let Err(reason) = &definition {
                warn!(agent = %name, %reason, "agent record is not runnable");
            }
            entries.push(CatalogEntry {
                node: node.id,
                name,
                definition,
            });
        }
        debug!(agents = entries.len(), "agent catalog loaded");
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First valid definition with this name.
    pub fn get(&self, name: &str) -> Option<&AgentDefinition> {
        self.entries
            .iter()
            .filter(|e| e.name == name)
            .find_map(|e| e.definition.as_ref().ok())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}
