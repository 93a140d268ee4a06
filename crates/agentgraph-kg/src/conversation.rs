//! Natural-language requests to graph queries, and results back to prose.
//!
//! Only generation and interpretation live here; running the query belongs
//! to the host store.

use crate::error::KgResult;
use agentgraph_llm::{LlmProvider, QueryResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Query returned for any request to describe the schema.
pub const SCHEMA_QUERY: &str = "CALL apoc.meta.schema()";

const GENERATE_CONTEXT: &str = "You are an expert in graph databases. \
Output only the raw Cypher query. \
If the request asks to describe or list the schema, use 'CALL apoc.meta.schema()'.";
const GENERATE_PREFIX: &str = "Translate this request into a Cypher query for Neo4j: ";
const INTERPRET_PREFIX: &str = "Explain these Neo4j results in plain language: ";

pub struct QueryAssistant {
    llm: Arc<dyn LlmProvider>,
    generate_model: String,
    interpret_model: String,
}

impl QueryAssistant {
    /// Empty model hints fall back to the client's default model.
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            generate_model: String::new(),
            interpret_model: String::new(),
        }
    }

    pub fn with_models(
        mut self,
        generate: impl Into<String>,
        interpret: impl Into<String>,
    ) -> Self {
        self.generate_model = generate.into();
        self.interpret_model = interpret.into();
        self
    }

    pub async fn generate_query(&self, request: &str) -> KgResult<QueryResult> {
        if asks_for_schema(request) {
            debug!("schema request, skipping generation");
            return Ok(QueryResult::new(SCHEMA_QUERY));
        }
        let prompt = format!("{}\n\n{}{}", GENERATE_CONTEXT, GENERATE_PREFIX, request);
        let reply = self.llm.query(&prompt, &self.generate_model).await?;
        Ok(QueryResult::new(strip_code_fences(reply.text())))
    }

    pub async fn interpret_results(&self, rows: &[Value]) -> KgResult<QueryResult> {
        let rendered = Value::Array(rows.to_vec()).to_string();
        let prompt = format!("{}{}", INTERPRET_PREFIX, rendered);
        Ok(self.llm.query(&prompt, &self.interpret_model).await?)
    }
}

fn asks_for_schema(request: &str) -> bool {
    let lower = request.to_lowercase();
    lower.contains("describe") && lower.contains("schema")
}

/// Body of the first fenced block, minus any language tag; otherwise the trimmed text.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed.to_string();
    };
    let rest = &trimmed[start + 3..];
    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    let body = match body.split_once('\n') {
        Some((tag, code)) if is_language_tag(tag.trim()) => code,
        _ => body,
    };
    body.trim().to_string()
}

/// Clauses a query may open with, so a fence line holding one is code.
const CYPHER_CLAUSES: &[&str] = &[
    "CALL", "CREATE", "DELETE", "DETACH", "EXPLAIN", "FOREACH", "LOAD", "MATCH", "MERGE",
    "OPTIONAL", "PROFILE", "REMOVE", "RETURN", "SET", "SHOW", "UNWIND", "USE", "WHERE", "WITH",
];

fn is_language_tag(line: &str) -> bool {
    line.is_empty()
        || (line.chars().all(|c| c.is_ascii_alphanumeric() || "+-_.#".contains(c))
            && !CYPHER_CLAUSES.iter().any(|k| k.eq_ignore_ascii_case(line)))
}
