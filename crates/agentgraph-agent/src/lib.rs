//! agentgraph agent - definitions, native/script/prompt agents, and dispatch

pub mod builtin;
pub mod catalog;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod runnable;
pub mod script;

pub use builtin::Rotate90Agent;
pub use catalog::{AgentCatalog, CatalogEntry};
pub use definition::{AgentDefinition, ExecutionStrategy};
pub use dispatch::{AgentOutcome, Dispatcher};
pub use error::{AgentError, AgentResult};
pub use factory::{AgentConstructor, AgentFactory};
pub use runnable::{render_prompt, LiteralAgent, PromptAgent, RunnableAgent};
pub use script::{default_engine, ScriptEngine};
#[cfg(feature = "rhai")]
pub use script::{RhaiLimits, RhaiScriptEngine};
