//! Graph store abstraction.
//!
//! Callers mutate the graph only through a [`GraphTransaction`]. Changes
//! become visible on `commit`; dropping a transaction discards them.

use crate::error::{GraphError, GraphResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

pub type NodeId = u64;
pub type EdgeId = u64;

/// Node and edge properties. Values are scalars or arrays of scalars.
pub type Properties = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub labels: BTreeSet<String>,
    pub properties: Properties,
}

impl Node {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub rel_type: String,
    pub properties: Properties,
}

/// Complete graph contents. Also serves as a read-only snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphState {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    next_node: NodeId,
    next_edge: EdgeId,
}

impl GraphState {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes_with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| n.has_label(label))
    }

    pub fn count_label(&self, label: &str) -> usize {
        self.nodes_with_label(label).count()
    }

    pub fn count_rel(&self, rel_type: &str) -> usize {
        self.edges.values().filter(|e| e.rel_type == rel_type).count()
    }

    /// Nodes whose `key` property equals `value`, optionally restricted to a label. Ordered by id.
    pub fn find_nodes(&self, label: Option<&str>, key: &str, value: &Value) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| label.map_or(true, |l| n.has_label(l)))
            .filter(|n| n.properties.get(key) == Some(value))
            .map(|n| n.id)
            .collect()
    }

    pub fn edges_from<'a>(
        &'a self,
        id: NodeId,
        rel_type: &'a str,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .values()
            .filter(move |e| e.from == id && e.rel_type == rel_type)
    }

    pub fn edges_to<'a>(
        &'a self,
        id: NodeId,
        rel_type: &'a str,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .values()
            .filter(move |e| e.to == id && e.rel_type == rel_type)
    }

    pub(crate) fn create_node(
        &mut self,
        labels: &[&str],
        properties: Properties,
    ) -> GraphResult<NodeId> {
        if labels.is_empty() {
            return Err(GraphError::MissingLabel);
        }
        let properties = checked(properties)?;
        self.next_node += 1;
        let id = self.next_node;
        self.nodes.insert(
            id,
            Node {
                id,
                labels: labels.iter().map(|l| l.to_string()).collect(),
                properties,
            },
        );
        Ok(id)
    }

    pub(crate) fn create_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: Properties,
    ) -> GraphResult<EdgeId> {
        for id in [from, to] {
            if !self.nodes.contains_key(&id) {
                return Err(GraphError::NodeNotFound(id));
            }
        }
        let properties = checked(properties)?;
        self.next_edge += 1;
        let id = self.next_edge;
        self.edges.insert(
            id,
            Edge {
                id,
                from,
                to,
                rel_type: rel_type.to_string(),
                properties,
            },
        );
        Ok(id)
    }

    pub(crate) fn set_property(&mut self, id: NodeId, key: &str, value: Value) -> GraphResult<()> {
        check_value(key, &value)?;
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        if value.is_null() {
            node.properties.remove(key);
        } else {
            node.properties.insert(key.to_string(), value);
        }
        Ok(())
    }

    pub(crate) fn detach_delete_labelled(&mut self, labels: &[&str]) -> usize {
        let doomed: BTreeSet<NodeId> = self
            .nodes
            .values()
            .filter(|n| labels.iter().any(|l| n.has_label(l)))
            .map(|n| n.id)
            .collect();
        self.edges
            .retain(|_, e| !doomed.contains(&e.from) && !doomed.contains(&e.to));
        self.nodes.retain(|id, _| !doomed.contains(id));
        doomed.len()
    }
}

/// Drops nulls and rejects values a property graph cannot hold.
fn checked(properties: Properties) -> GraphResult<Properties> {
    let mut out = Properties::new();
    for (key, value) in properties {
        if value.is_null() {
            continue;
        }
        check_value(&key, &value)?;
        out.insert(key, value);
    }
    Ok(out)
}

fn check_value(key: &str, value: &Value) -> GraphResult<()> {
    let invalid = |reason: &str| GraphError::InvalidProperty {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    match value {
        Value::Object(_) => Err(invalid("nested maps are not allowed")),
        Value::Array(items) => {
            if items.iter().all(|v| !v.is_object() && !v.is_array() && !v.is_null()) {
                Ok(())
            } else {
                Err(invalid("arrays may only hold scalars"))
            }
        }
        _ => Ok(()),
    }
}

/// A unit of work against the graph. Dropping without `commit` rolls back.
pub trait GraphTransaction {
    fn create_node(&mut self, labels: &[&str], properties: Properties) -> GraphResult<NodeId>;

    fn create_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: Properties,
    ) -> GraphResult<EdgeId>;

    fn set_property(&mut self, id: NodeId, key: &str, value: Value) -> GraphResult<()>;

    /// Delete every node carrying any of `labels`, along with its edges.
    fn detach_delete_labelled(&mut self, labels: &[&str]) -> GraphResult<usize>;

    /// Read view including this transaction's uncommitted changes.
    fn view(&self) -> &GraphState;

    fn find_nodes(&self, label: Option<&str>, key: &str, value: &Value) -> Vec<NodeId> {
        self.view().find_nodes(label, key, value)
    }

    /// Return the first node with `label` and `key = value`, creating it if absent.
    fn merge_node(
        &mut self,
        label: &str,
        key: &str,
        value: Value,
        properties: Properties,
    ) -> GraphResult<NodeId> {
        if let Some(id) = self.find_nodes(Some(label), key, &value).first() {
            return Ok(*id);
        }
        let mut properties = properties;
        properties.insert(key.to_string(), value);
        self.create_node(&[label], properties)
    }

    fn commit(self: Box<Self>) -> GraphResult<()>;
}

/// Storage backend. Transactions are serialized: `begin` waits for any open one to finish.
pub trait GraphStore: Send + Sync {
    fn begin(&self) -> GraphResult<Box<dyn GraphTransaction + '_>>;

    fn snapshot(&self) -> GraphResult<GraphState>;
}
