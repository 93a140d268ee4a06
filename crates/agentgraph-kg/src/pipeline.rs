//! Batch ingestion: wipe, then materialize each document in its own transaction.
//!
//! Per document the order is fixed: document node, capabilities, agents
//! (with their capability links), relationships. Any error inside that
//! sequence rolls the document back and the batch moves on.

use crate::document::{KnowledgeGraphDocument, RawDocument};
use crate::error::{KgError, KgResult};
use crate::flatten::flatten_entry;
use crate::report::{DocumentOutcome, DocumentStatus, IngestionReport};
use crate::source::DocumentSource;
use crate::validator;
use agentgraph_agent::definition::capability_names;
use agentgraph_core::UsageTracker;
use agentgraph_graph::{GraphHandle, GraphTransaction, NodeId, Properties};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const KNOWLEDGE_GRAPH_LABEL: &str = "KnowledgeGraph";
pub const AGENT_LABEL: &str = agentgraph_agent::catalog::AGENT_LABEL;
pub const CAPABILITY_LABEL: &str = "Capability";
pub const RELATIONSHIP_LABEL: &str = "Relationship";

pub const HAS_CAPABILITY: &str = agentgraph_agent::catalog::HAS_CAPABILITY;
pub const HAS_AGENT: &str = "HAS_AGENT";
pub const RELATES_TO: &str = "RELATES_TO";

/// Labels removed before every batch.
pub const OWNED_LABELS: &[&str] = &[
    KNOWLEDGE_GRAPH_LABEL,
    AGENT_LABEL,
    CAPABILITY_LABEL,
    RELATIONSHIP_LABEL,
];

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    capabilities: usize,
    agents: usize,
    capability_links: usize,
    relationships: usize,
    skipped_links: usize,
}

impl From<Counts> for DocumentStatus {
    fn from(c: Counts) -> Self {
        DocumentStatus::Loaded {
            capabilities: c.capabilities,
            agents: c.agents,
            capability_links: c.capability_links,
            relationships: c.relationships,
            skipped_links: c.skipped_links,
        }
    }
}

pub struct IngestionPipeline {
    graph: GraphHandle,
    usage: UsageTracker,
}

impl IngestionPipeline {
    pub fn new(graph: GraphHandle) -> Self {
        Self {
            graph,
            usage: UsageTracker::new(),
        }
    }

    pub fn with_usage(mut self, usage: UsageTracker) -> Self {
        self.usage = usage;
        self
    }

    pub fn graph(&self) -> &GraphHandle {
        &self.graph
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Read every document from `source` and ingest the batch.
    pub fn ingest_source(&self, source: &DocumentSource) -> KgResult<IngestionReport> {
        let mut report = self.start_batch()?;
        for item in source.read() {
            let outcome = match item {
                Ok(raw) => self.ingest_one(&raw),
                Err(unreadable) => {
                    warn!(
                        source = %unreadable.source,
                        error = %unreadable.message,
                        "document unreadable"
                    );
                    DocumentOutcome {
                        source: unreadable.source,
                        domain: None,
                        status: DocumentStatus::Failed {
                            message: unreadable.message,
                        },
                    }
                }
            };
            report.push(outcome);
        }
        Ok(self.finish_batch(report))
    }

    /// Wipe the owned labels, then ingest `documents` in order.
    ///
    /// Only a failed wipe is an error; per-document problems land in the report.
    pub fn ingest(&self, documents: &[RawDocument]) -> KgResult<IngestionReport> {
        let mut report = self.start_batch()?;
        for raw in documents {
            report.push(self.ingest_one(raw));
        }
        Ok(self.finish_batch(report))
    }

    fn start_batch(&self) -> KgResult<IngestionReport> {
        let mut report = IngestionReport::new(&uuid::Uuid::new_v4().to_string());
        let mut tx = self.graph.begin()?;
        report.wiped = tx.detach_delete_labelled(OWNED_LABELS)?;
        tx.commit()?;
        info!(batch = %report.batch_id, wiped = report.wiped, "cleaned existing nodes");
        Ok(report)
    }

    fn finish_batch(&self, mut report: IngestionReport) -> IngestionReport {
        report.finish();
        info!(
            batch = %report.batch_id,
            documents = report.outcomes.len(),
            loaded = report.loaded(),
            "batch complete"
        );
        report
    }

    fn ingest_one(&self, raw: &RawDocument) -> DocumentOutcome {
        let failed = |domain: Option<String>, message: String| {
            warn!(source = %raw.source, error = %message, "document failed");
            DocumentOutcome {
                source: raw.source.clone(),
                domain,
                status: DocumentStatus::Failed { message },
            }
        };

        let body = match raw.parse_json() {
            Ok(body) => body,
            Err(e) => return failed(None, e.to_string()),
        };
        if let Err(reason) = validator::check(&body) {
            warn!(source = %raw.source, reason = %reason, "invalid KG structure");
            return DocumentOutcome {
                source: raw.source.clone(),
                domain: None,
                status: DocumentStatus::Rejected { message: reason },
            };
        }
        let doc = match KnowledgeGraphDocument::new(raw, body) {
            Ok(doc) => doc,
            Err(e) => return failed(None, e.to_string()),
        };

        match self.commit_document(&doc) {
            Ok(counts) => {
                self.usage.record(&format!("kg:{}", doc.domain));
                info!(
                    domain = %doc.domain,
                    capabilities = counts.capabilities,
                    agents = counts.agents,
                    relationships = counts.relationships,
                    skipped_links = counts.skipped_links,
                    "loaded KG"
                );
                DocumentOutcome {
                    source: doc.source.clone(),
                    domain: Some(doc.domain.clone()),
                    status: counts.into(),
                }
            }
            Err(e) => failed(Some(doc.domain.clone()), e.to_string()),
        }
    }

    fn commit_document(&self, doc: &KnowledgeGraphDocument) -> KgResult<Counts> {
        let mut tx = self.graph.begin()?;
        let counts = materialize(tx.as_mut(), doc)?;
        tx.commit()?;
        Ok(counts)
    }
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

fn name_value(name: &str) -> Value {
    Value::String(name.to_string())
}

/// Write one document into an open transaction. The caller commits.
fn materialize<'t>(
    tx: &mut (dyn GraphTransaction + 't),
    doc: &KnowledgeGraphDocument,
) -> KgResult<Counts> {
    let mut counts = Counts::default();

    let mut props = Properties::new();
    props.insert("name".into(), name_value(&doc.domain));
    props.insert("description".into(), Value::String(doc.description.clone()));
    props.insert("content".into(), Value::String(doc.content.clone()));
    props.insert("created_at".into(), now());
    let kg = tx.create_node(&[KNOWLEDGE_GRAPH_LABEL], props)?;

    for entry in doc.section("capabilities") {
        let Some(fields) = entry.as_object() else {
            continue;
        };
        let mut props = flatten_entry(fields, &[])?;
        props.insert("created_at".into(), now());
        let cap = tx.create_node(&[CAPABILITY_LABEL], props)?;
        tx.create_edge(kg, cap, HAS_CAPABILITY, Properties::new())?;
        counts.capabilities += 1;
    }

    for entry in doc.section("agents") {
        let Some(fields) = entry.as_object() else {
            continue;
        };
        let mut props = flatten_entry(fields, &["capabilities"])?;
        props.insert("kgName".into(), name_value(&doc.domain));
        props.insert("created_at".into(), now());
        let agent = tx.create_node(&[AGENT_LABEL], props)?;
        tx.create_edge(kg, agent, HAS_AGENT, Properties::new())?;
        counts.agents += 1;

        for cap_name in capability_names(fields.get("capabilities"))? {
            let targets = tx.find_nodes(Some(CAPABILITY_LABEL), "name", &name_value(&cap_name));
            if targets.is_empty() {
                debug!(
                    agent = ?fields.get("name"),
                    capability = %cap_name,
                    "capability link skipped"
                );
                counts.skipped_links += 1;
                continue;
            }
            for cap in targets {
                tx.create_edge(agent, cap, HAS_CAPABILITY, Properties::new())?;
                counts.capability_links += 1;
            }
        }
    }

    for entry in doc.section("relationships") {
        let Some(fields) = entry.as_object() else {
            continue;
        };
        let from = required_str(fields.get("from"), "from")?;
        let to = required_str(fields.get("to"), "to")?;
        let rel_type = required_str(fields.get("type"), "type")?;
        let description = match fields.get("description") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        let sources = tx.find_nodes(None, "name", &name_value(from));
        let targets = tx.find_nodes(None, "name", &name_value(to));
        if sources.is_empty() || targets.is_empty() {
            debug!(from, to, rel_type, "relationship skipped, endpoint missing");
            counts.skipped_links += 1;
            continue;
        }
        for &a in &sources {
            for &b in &targets {
                relate(tx, a, b, rel_type, &description)?;
                counts.relationships += 1;
            }
        }
    }

    Ok(counts)
}

fn relate<'t>(
    tx: &mut (dyn GraphTransaction + 't),
    from: NodeId,
    to: NodeId,
    rel_type: &str,
    description: &str,
) -> KgResult<()> {
    let mut props = Properties::new();
    props.insert("type".into(), Value::String(rel_type.to_string()));
    props.insert("description".into(), Value::String(description.to_string()));
    tx.create_edge(from, to, RELATES_TO, props)?;
    Ok(())
}

fn required_str<'a>(value: Option<&'a Value>, field: &str) -> KgResult<&'a str> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| KgError::field(field, "must be a string"))
}
