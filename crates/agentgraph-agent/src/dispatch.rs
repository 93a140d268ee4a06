//! Resolve agent definitions into runnable agents.

use crate::catalog::AgentCatalog;
use crate::definition::{AgentDefinition, ExecutionStrategy};
use crate::error::{AgentError, AgentResult};
use crate::factory::AgentFactory;
use crate::runnable::{LiteralAgent, PromptAgent, RunnableAgent};
use crate::script::{self, ScriptEngine};
use agentgraph_core::{Settings, UsageTracker};
use agentgraph_graph::GraphHandle;
use agentgraph_llm::LlmProvider;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of instantiating one catalogued agent.
pub struct AgentOutcome {
    pub name: String,
    pub result: AgentResult<Arc<dyn RunnableAgent>>,
}

impl AgentOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn message(&self) -> String {
        match &self.result {
            Ok(agent) => format!("Created agent {} ({})", self.name, agent.kind()),
            Err(e) => format!("Failed to create agent {}: {}", self.name, e),
        }
    }
}

pub struct Dispatcher {
    factory: Arc<AgentFactory>,
    scripts: Option<Arc<dyn ScriptEngine>>,
    scripts_enabled: bool,
    llm: Arc<dyn LlmProvider>,
    usage: UsageTracker,
}

impl Dispatcher {
    /// Dispatcher with the built-in classes, the default script engine
    /// (disabled), and a fresh usage tracker.
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            factory: Arc::new(AgentFactory::with_builtins()),
            scripts: script::default_engine(),
            scripts_enabled: false,
            llm,
            usage: UsageTracker::new(),
        }
    }

    pub fn from_settings(settings: &Settings, llm: Arc<dyn LlmProvider>) -> Self {
        Self::new(llm).enable_scripts(settings.scripts_enabled)
    }

    pub fn with_factory(mut self, factory: AgentFactory) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn with_script_engine(mut self, engine: Arc<dyn ScriptEngine>) -> Self {
        self.scripts = Some(engine);
        self
    }

    pub fn without_script_engine(mut self) -> Self {
        self.scripts = None;
        self
    }

    pub fn enable_scripts(mut self, enabled: bool) -> Self {
        self.scripts_enabled = enabled;
        self
    }

    pub fn with_usage(mut self, usage: UsageTracker) -> Self {
        self.usage = usage;
        self
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn factory(&self) -> &AgentFactory {
        &self.factory
    }

    pub fn create_agent(
        &self,
        definition: &AgentDefinition,
        graph: &GraphHandle,
    ) -> AgentResult<Arc<dyn RunnableAgent>> {
        let name = definition.display_name();
        debug!(agent = name, strategy = definition.strategy.kind(), "creating agent");

        let agent = match &definition.strategy {
            ExecutionStrategy::ClassRef { qualified_name } => {
                self.factory.instantiate(qualified_name, graph.clone())?
            }
            ExecutionStrategy::Script { body } => {
                if !self.scripts_enabled {
                    return Err(AgentError::ScriptEvaluationFailure(
                        "script agents are disabled (set agents.scripts.enabled=true)".into(),
                    ));
                }
                let engine = self.scripts.as_ref().ok_or_else(|| {
                    AgentError::ScriptEvaluationFailure("no script engine available".into())
                })?;
                engine.instantiate(body, graph)?
            }
            ExecutionStrategy::PromptTemplate { text } => {
                Arc::new(PromptAgent::new(text.clone(), self.llm.clone()))
            }
            ExecutionStrategy::LegacyLiteral { text } => {
                warn!(agent = name, "literal agent ignores its input");
                Arc::new(LiteralAgent::new(text.clone()))
            }
        };

        self.usage.record(&format!("agent:{}", name));
        Ok(agent)
    }

    /// Parse a raw definition and create the agent.
    pub fn create_from_value(
        &self,
        definition: &Value,
        graph: &GraphHandle,
    ) -> AgentResult<Arc<dyn RunnableAgent>> {
        let definition = AgentDefinition::from_value(definition)?;
        self.create_agent(&definition, graph)
    }

    /// Create every agent in the catalog. Failures are reported per agent.
    pub fn instantiate_all(
        &self,
        catalog: &AgentCatalog,
        graph: &GraphHandle,
    ) -> Vec<AgentOutcome> {
        let outcomes: Vec<AgentOutcome> = catalog
            .entries()
            .iter()
            .map(|entry| AgentOutcome {
                name: entry.name.clone(),
                result: match &entry.definition {
                    Ok(def) => self.create_agent(def, graph),
                    Err(e) => Err(AgentError::InvalidDefinition(e.clone())),
                },
            })
            .collect();
        let created = outcomes.iter().filter(|o| o.is_ok()).count();
        info!(created, failed = outcomes.len() - created, "agents instantiated");
        outcomes
    }
}
