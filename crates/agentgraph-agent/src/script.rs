//! Embedded script agents.
//!
//! Scripts run arbitrary code supplied by graph records, so evaluation is a
//! trust boundary: the dispatcher refuses scripts unless they have been
//! enabled explicitly, and the Rhai engine runs with operation, depth and
//! size limits.
//!
//! A script yields an agent in one of two ways:
//!
//! ```text
//! |input| #{ echoed: input, nodes: graph.node_count() }
//! ```
//!
//! or by defining a function, which may take the graph as a leading parameter
//! since script functions cannot see outer variables:
//!
//! ```text
//! fn generate_candidate(graph, input) { graph.has_node(input) }
//! ```

use crate::error::AgentResult;
use crate::runnable::RunnableAgent;
use agentgraph_graph::GraphHandle;
use std::sync::Arc;

/// Name of the variable holding the graph handle inside scripts.
pub const GRAPH_BINDING: &str = "graph";

/// Name of the entry-point function a script may define.
pub const ENTRY_POINT: &str = "generate_candidate";

pub trait ScriptEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate `body` with the graph bound and return the agent it produces.
    fn instantiate(&self, body: &str, graph: &GraphHandle) -> AgentResult<Arc<dyn RunnableAgent>>;
}

/// The engine compiled into this build, if any.
pub fn default_engine() -> Option<Arc<dyn ScriptEngine>> {
    #[cfg(feature = "rhai")]
    {
        Some(Arc::new(rhai_engine::RhaiScriptEngine::default()))
    }
    #[cfg(not(feature = "rhai"))]
    {
        None
    }
}

#[cfg(feature = "rhai")]
pub use rhai_engine::{RhaiLimits, RhaiScriptEngine};

#[cfg(feature = "rhai")]
mod rhai_engine {
    use super::{ScriptEngine, ENTRY_POINT, GRAPH_BINDING};
    use crate::error::{AgentError, AgentResult};
    use crate::runnable::RunnableAgent;
    use agentgraph_graph::GraphHandle;
    use rhai::{CallFnOptions, Dynamic, Engine, FnPtr, Scope, AST};
    use serde_json::Value;
    use std::sync::Arc;
    use tracing::debug;

    #[derive(Debug, Clone, Copy)]
    pub struct RhaiLimits {
        pub max_operations: u64,
        pub max_expr_depth: usize,
        pub max_function_expr_depth: usize,
        pub max_call_levels: usize,
        pub max_string_size: usize,
        pub max_array_size: usize,
        pub max_map_size: usize,
    }

    impl Default for RhaiLimits {
        fn default() -> Self {
            Self {
                max_operations: 500_000,
                max_expr_depth: 64,
                max_function_expr_depth: 32,
                max_call_levels: 32,
                max_string_size: 1 << 20,
                max_array_size: 100_000,
                max_map_size: 10_000,
            }
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct RhaiScriptEngine {
        limits: RhaiLimits,
    }

    impl RhaiScriptEngine {
        pub fn with_limits(limits: RhaiLimits) -> Self {
            Self { limits }
        }

        /// A fresh interpreter per script.
        fn engine(&self) -> Engine {
            let l = &self.limits;
            let mut engine = Engine::new();
            engine
                .set_max_operations(l.max_operations)
                .set_max_expr_depths(l.max_expr_depth, l.max_function_expr_depth)
                .set_max_call_levels(l.max_call_levels)
                .set_max_string_size(l.max_string_size)
                .set_max_array_size(l.max_array_size)
                .set_max_map_size(l.max_map_size);
            engine.disable_symbol("eval");
            engine
                .register_type_with_name::<GraphHandle>("Graph")
                .register_fn("node_count", |g: &mut GraphHandle| g.node_count() as i64)
                .register_fn("has_node", |g: &mut GraphHandle, name: &str| g.has_node(name));
            engine
        }
    }

    impl ScriptEngine for RhaiScriptEngine {
        fn name(&self) -> &str {
            "rhai"
        }

        fn instantiate(
            &self,
            body: &str,
            graph: &GraphHandle,
        ) -> AgentResult<Arc<dyn RunnableAgent>> {
            let engine = self.engine();
            let ast = engine
                .compile(body)
                .map_err(|e| AgentError::ScriptEvaluationFailure(e.to_string()))?;

            let mut scope = Scope::new();
            scope.push(GRAPH_BINDING, graph.clone());
            let result: Dynamic = engine
                .eval_ast_with_scope(&mut scope, &ast)
                .map_err(|e| AgentError::ScriptEvaluationFailure(e.to_string()))?;

            let entry = if result.is::<FnPtr>() {
                Entry::Closure(result)
            } else {
                let arity = ast
                    .iter_functions()
                    .filter(|f| f.name == ENTRY_POINT)
                    .map(|f| f.params.len())
                    .max();
                match arity {
                    Some(1) => Entry::Function { with_graph: false },
                    Some(2) => Entry::Function { with_graph: true },
                    Some(n) => {
                        return Err(AgentError::ScriptEvaluationFailure(format!(
                            "{} takes {} parameters, expected 1 or 2",
                            ENTRY_POINT, n
                        )))
                    }
                    None => {
                        return Err(AgentError::ScriptEvaluationFailure(format!(
                            "script evaluated to {}, not a closure, and defines no {} function",
                            result.type_name(),
                            ENTRY_POINT
                        )))
                    }
                }
            };
            debug!(entry = entry.describe(), "script agent ready");

            Ok(Arc::new(RhaiAgent {
                engine,
                ast,
                entry,
                graph: graph.clone(),
            }))
        }
    }

    enum Entry {
        /// Holds a `FnPtr`.
        Closure(Dynamic),
        Function { with_graph: bool },
    }

    impl Entry {
        fn describe(&self) -> &'static str {
            match self {
                Entry::Closure(_) => "closure",
                Entry::Function { .. } => "function",
            }
        }
    }

    struct RhaiAgent {
        engine: Engine,
        ast: AST,
        entry: Entry,
        graph: GraphHandle,
    }

    impl RhaiAgent {
        fn run(&self, input: &Value) -> AgentResult<Value> {
            let arg = rhai::serde::to_dynamic(input).map_err(exec_err)?;
            let out: Dynamic = match &self.entry {
                Entry::Closure(f) => {
                    let f = f.clone_cast::<FnPtr>();
                    f.call::<Dynamic>(&self.engine, &self.ast, (arg,))
                }
                Entry::Function { with_graph } => {
                    let options = CallFnOptions::new().eval_ast(false);
                    let mut scope = Scope::new();
                    if *with_graph {
                        self.engine.call_fn_with_options::<Dynamic>(
                            options,
                            &mut scope,
                            &self.ast,
                            ENTRY_POINT,
                            (self.graph.clone(), arg),
                        )
                    } else {
                        self.engine.call_fn_with_options::<Dynamic>(
                            options,
                            &mut scope,
                            &self.ast,
                            ENTRY_POINT,
                            (arg,),
                        )
                    }
                }
            }
            .map_err(exec_err)?;
            rhai::serde::from_dynamic::<Value>(&out).map_err(exec_err)
        }
    }

    fn exec_err(e: Box<rhai::EvalAltResult>) -> AgentError {
        AgentError::Execution(e.to_string())
    }

    #[async_trait::async_trait]
    impl RunnableAgent for RhaiAgent {
        fn kind(&self) -> &'static str {
            "script"
        }

        async fn generate_candidate(&self, input: &Value) -> AgentResult<Value> {
            self.run(input)
        }
    }

}
