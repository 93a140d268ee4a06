//! Registry of native agent types, looked up by class name.
//!
//! Each entry maps a name to a constructor. Graph-aware constructors take the
//! graph handle as their only argument; agents registered with a no-argument
//! constructor cannot be created from a class reference.

use crate::builtin::Rotate90Agent;
use crate::error::{AgentError, AgentResult};
use crate::runnable::RunnableAgent;
use agentgraph_graph::GraphHandle;
use std::collections::HashMap;
use std::sync::Arc;

pub type GraphConstructor =
    Arc<dyn Fn(GraphHandle) -> Result<Arc<dyn RunnableAgent>, String> + Send + Sync>;
pub type NoArgConstructor = Arc<dyn Fn() -> Result<Arc<dyn RunnableAgent>, String> + Send + Sync>;

#[derive(Clone)]
pub enum AgentConstructor {
    WithGraph(GraphConstructor),
    NoArgs(NoArgConstructor),
}

impl AgentConstructor {
    pub fn with_graph<F>(f: F) -> Self
    where
        F: Fn(GraphHandle) -> Result<Arc<dyn RunnableAgent>, String> + Send + Sync + 'static,
    {
        Self::WithGraph(Arc::new(f))
    }

    pub fn no_args<F>(f: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn RunnableAgent>, String> + Send + Sync + 'static,
    {
        Self::NoArgs(Arc::new(f))
    }
}

#[derive(Clone, Default)]
pub struct AgentFactory {
    constructors: HashMap<String, AgentConstructor>,
}

impl AgentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory preloaded with the built-in agent classes.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        let rotate = AgentConstructor::with_graph(|graph| {
            Ok(Arc::new(Rotate90Agent::new(graph)) as Arc<dyn RunnableAgent>)
        });
        for name in [
            Rotate90Agent::REGISTRY_NAME,
            Rotate90Agent::QUALIFIED_NAME,
            Rotate90Agent::SHORT_NAME,
        ] {
            factory.register(name, rotate.clone());
        }
        factory
    }

    /// Register a constructor. Replaces any existing entry with the same name.
    pub fn register(&mut self, name: impl Into<String>, constructor: AgentConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.constructors.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    pub fn instantiate(
        &self,
        name: &str,
        graph: GraphHandle,
    ) -> AgentResult<Arc<dyn RunnableAgent>> {
        match self.constructors.get(name) {
            None => Err(AgentError::ClassNotFound(name.to_string())),
            Some(AgentConstructor::NoArgs(_)) => {
                Err(AgentError::ConstructorMismatch(name.to_string()))
            }
            Some(AgentConstructor::WithGraph(ctor)) => {
                ctor(graph).map_err(|reason| AgentError::InstantiationFailure {
                    class: name.to_string(),
                    reason,
                })
            }
        }
    }
}
