//! agentgraph-kg - knowledge-graph ingestion and the services built on it.
//!
//! Documents are validated, then each one is materialized in its own graph
//! transaction. Domain creation, query generation and agent authoring use
//! the shared LLM client against the same graph.

pub mod authoring;
pub mod conversation;
pub mod document;
pub mod domain;
pub mod error;
pub mod flatten;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod validator;

pub use authoring::{AgentAuthor, AgentKind, AuthoringOutcome};
pub use conversation::{strip_code_fences, QueryAssistant, SCHEMA_QUERY};
pub use document::{KnowledgeGraphDocument, RawDocument};
pub use domain::{BillingTerms, DomainCreator, DomainOutcome, DomainRequest, ExamplePhase};
pub use error::{KgError, KgResult};
pub use flatten::flatten_entry;
pub use pipeline::IngestionPipeline;
pub use report::{DocumentOutcome, DocumentStatus, IngestionReport};
pub use source::{DocumentSource, Unreadable};
pub use validator::validate;
