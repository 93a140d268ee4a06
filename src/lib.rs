//! agentgraph - knowledge-graph ingestion and dynamic agent dispatch.
//!
//! This crate re-exports the workspace members under one roof:
//!
//! - [`core`]: settings resolution and usage counters
//! - [`llm`]: the resilient completion client
//! - [`graph`]: the transactional graph store
//! - [`agent`]: agent definitions and dispatch
//! - [`kg`]: document validation, ingestion, and the LLM-backed services

pub use agentgraph_agent as agent;
pub use agentgraph_core as core;
pub use agentgraph_graph as graph;
pub use agentgraph_kg as kg;
pub use agentgraph_llm as llm;

pub use agentgraph_agent::{AgentCatalog, AgentDefinition, Dispatcher, RunnableAgent};
pub use agentgraph_core::{Settings, UsageTracker};
pub use agentgraph_graph::GraphHandle;
pub use agentgraph_kg::{DocumentSource, IngestionPipeline, IngestionReport, RawDocument};
pub use agentgraph_llm::{LlmClient, LlmProvider, QueryResult};
