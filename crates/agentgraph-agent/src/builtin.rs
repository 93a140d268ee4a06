//! Built-in native agents.

use crate::error::{AgentError, AgentResult};
use crate::runnable::RunnableAgent;
use agentgraph_graph::GraphHandle;
use serde_json::Value;

/// Rotates a rectangular grid 90 degrees clockwise.
///
/// The candidate is a one-element list holding the rotated grid.
pub struct Rotate90Agent {
    graph: GraphHandle,
}

impl Rotate90Agent {
    pub const QUALIFIED_NAME: &'static str = "specialized_agents.Rotate90Agent";
    /// Fully qualified name used by the default agent registry records.
    pub const REGISTRY_NAME: &'static str =
        "com.safeai.neo4jplugin.specialized_agents.Rotate90Agent";
    pub const SHORT_NAME: &'static str = "Rotate90Agent";

    pub fn new(graph: GraphHandle) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &GraphHandle {
        &self.graph
    }
}

/// Rotate `grid` clockwise. Rows must all have the same length.
pub fn rotate_clockwise(grid: &[Vec<Value>]) -> AgentResult<Vec<Vec<Value>>> {
    let Some(first) = grid.first() else {
        return Ok(Vec::new());
    };
    let width = first.len();
    if grid.iter().any(|row| row.len() != width) {
        return Err(AgentError::Execution("grid rows have unequal lengths".into()));
    }
    Ok((0..width)
        .map(|col| grid.iter().rev().map(|row| row[col].clone()).collect())
        .collect())
}

fn parse_grid(input: &Value) -> AgentResult<Vec<Vec<Value>>> {
    let rows = match input {
        Value::Object(o) => o.get("grid"),
        other => Some(other),
    }
    .and_then(Value::as_array)
    .ok_or_else(|| AgentError::Execution("expected a grid (array of rows)".into()))?;

    rows.iter()
        .map(|row| {
            row.as_array()
                .cloned()
                .ok_or_else(|| AgentError::Execution("grid row is not an array".into()))
        })
        .collect()
}

#[async_trait::async_trait]
impl RunnableAgent for Rotate90Agent {
    fn kind(&self) -> &'static str {
        "class"
    }

    async fn generate_candidate(&self, input: &Value) -> AgentResult<Value> {
        let grid = parse_grid(input)?;
        let rotated = rotate_clockwise(&grid)?;
        let rows: Vec<Value> = rotated.into_iter().map(Value::Array).collect();
        Ok(Value::Array(vec![Value::Array(rows)]))
    }
}
