//! Tests for agentgraph-agent: strategy dispatch, factory lookup, scripts, catalog

use agentgraph_agent::*;
use agentgraph_graph::{GraphHandle, Properties};
use agentgraph_llm::{LlmClient, LlmProvider, LlmResult, QueryResult};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Provider returning a fixed reply and remembering prompts.
struct CannedProvider {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    async fn query(&self, prompt: &str, _model_hint: &str) -> LlmResult<QueryResult> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(QueryResult::new(self.reply.clone()))
    }
}

fn simulated_dispatcher() -> Dispatcher {
    Dispatcher::new(Arc::new(LlmClient::simulated()))
}

fn props(v: Value) -> Properties {
    v.as_object().cloned().unwrap_or_default()
}

// ===========================================================================
// Prompt-template agents
// ===========================================================================

#[tokio::test]
async fn prompt_agent_with_unconfigured_backend_echoes() {
    let graph = GraphHandle::in_memory();
    let agent = simulated_dispatcher()
        .create_from_value(&json!({"llmPrompt": "Summarize: "}), &graph)
        .unwrap();
    let out = agent.generate_candidate(&json!(["x", "y"])).await.unwrap();
    let text = out.as_str().unwrap();
    assert!(text.starts_with("Simulated LLM response: "));
    assert!(text.contains("Summarize:"));
    assert!(text.contains(r#"["x","y"]"#));
}

#[tokio::test]
async fn prompt_agent_forwards_rendered_prompt() {
    let llm = CannedProvider::new("rotated grid");
    let dispatcher = Dispatcher::new(llm.clone());
    let agent = dispatcher
        .create_from_value(
            &json!({"name": "P", "llm_prompt": "Rotate this grid."}),
            &GraphHandle::in_memory(),
        )
        .unwrap();
    assert_eq!(agent.kind(), "prompt");
    let out = agent.generate_candidate(&json!([[1, 2], [3, 4]])).await.unwrap();
    assert_eq!(out, json!("rotated grid"));
    assert_eq!(
        llm.prompts.lock().unwrap().as_slice(),
        ["Rotate this grid. Input: [[1,2],[3,4]]"]
    );
}

#[tokio::test]
async fn blank_backend_reply_becomes_placeholder() {
    let dispatcher = Dispatcher::new(CannedProvider::new("   "));
    let agent = dispatcher
        .create_from_value(&json!({"llmLogic": "Think."}), &GraphHandle::in_memory())
        .unwrap();
    let out = agent.generate_candidate(&Value::Null).await.unwrap();
    assert_eq!(out, json!("Simulated LLM response (empty): Think."));
}

// ===========================================================================
// Class references
// ===========================================================================

#[tokio::test]
async fn rotate_agent_by_every_registered_name() {
    let dispatcher = simulated_dispatcher();
    let graph = GraphHandle::in_memory();
    for class in [
        "com.safeai.neo4jplugin.specialized_agents.Rotate90Agent",
        "specialized_agents.Rotate90Agent",
        "Rotate90Agent",
    ] {
        let agent = dispatcher
            .create_from_value(&json!({"class": class}), &graph)
            .unwrap();
        let out = agent.generate_candidate(&json!([[1, 2], [3, 4]])).await.unwrap();
        assert_eq!(out, json!([[[3, 1], [4, 2]]]));
    }
}

#[test]
fn unknown_class_is_not_found() {
    let err = simulated_dispatcher()
        .create_from_value(&json!({"class": "nope.Missing"}), &GraphHandle::in_memory())
        .err()
        .unwrap();
    assert!(matches!(err, AgentError::ClassNotFound(ref c) if c == "nope.Missing"));
}

#[test]
fn no_arg_constructor_is_a_mismatch() {
    let mut factory = AgentFactory::new();
    factory.register(
        "Plain",
        AgentConstructor::no_args(|| {
            Ok(Arc::new(LiteralAgent::new("x")) as Arc<dyn RunnableAgent>)
        }),
    );
    let dispatcher = simulated_dispatcher().with_factory(factory);
    let err = dispatcher
        .create_from_value(&json!({"class": "Plain"}), &GraphHandle::in_memory())
        .err()
        .unwrap();
    assert!(matches!(err, AgentError::ConstructorMismatch(_)));
}

#[test]
fn failing_constructor_is_instantiation_failure() {
    let mut factory = AgentFactory::new();
    factory.register(
        "Broken",
        AgentConstructor::with_graph(|_| Err("missing model weights".to_string())),
    );
    let dispatcher = simulated_dispatcher().with_factory(factory);
    match dispatcher.create_from_value(&json!({"class": "Broken"}), &GraphHandle::in_memory()) {
        Err(AgentError::InstantiationFailure { class, reason }) => {
            assert_eq!(class, "Broken");
            assert_eq!(reason, "missing model weights");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected failure"),
    }
}

#[test]
fn builtin_names_are_listed() {
    let factory = AgentFactory::with_builtins();
    assert_eq!(
        factory.names(),
        vec![
            "Rotate90Agent",
            "com.safeai.neo4jplugin.specialized_agents.Rotate90Agent",
            "specialized_agents.Rotate90Agent",
        ]
    );
}

// ===========================================================================
// Literal and invalid definitions
// ===========================================================================

#[tokio::test]
async fn literal_agent_ignores_input() {
    let agent = simulated_dispatcher()
        .create_from_value(&json!({"literalResponse": "fixed"}), &GraphHandle::in_memory())
        .unwrap();
    assert_eq!(agent.generate_candidate(&json!([1])).await.unwrap(), json!("fixed"));
    assert_eq!(agent.generate_candidate(&json!("other")).await.unwrap(), json!("fixed"));
}

#[test]
fn definition_without_strategy_is_invalid() {
    let err = simulated_dispatcher()
        .create_from_value(&json!({"name": "Empty", "description": "d"}), &GraphHandle::in_memory())
        .err()
        .unwrap();
    assert!(matches!(err, AgentError::InvalidDefinition(_)));
}

// ===========================================================================
// Scripts
// ===========================================================================

#[test]
fn scripts_refused_unless_enabled() {
    let err = simulated_dispatcher()
        .create_from_value(&json!({"script": "|x| x"}), &GraphHandle::in_memory())
        .err()
        .unwrap();
    assert!(matches!(err, AgentError::ScriptEvaluationFailure(ref m) if m.contains("disabled")));
}

#[test]
fn scripts_without_engine_fail() {
    let dispatcher = simulated_dispatcher().without_script_engine().enable_scripts(true);
    let err = dispatcher
        .create_from_value(&json!({"script": "|x| x"}), &GraphHandle::in_memory())
        .err()
        .unwrap();
    assert!(matches!(err, AgentError::ScriptEvaluationFailure(_)));
}

#[cfg(feature = "rhai")]
#[tokio::test]
async fn script_agent_sees_graph() {
    let graph = GraphHandle::in_memory();
    {
        let mut tx = graph.begin().unwrap();
        tx.create_node(&["Capability"], props(json!({"name": "scan"}))).unwrap();
        tx.commit().unwrap();
    }
    let code = r#"|input| #{
        echo: input, nodes: graph.node_count(), known: graph.has_node("scan")
    }"#;
    let dispatcher = simulated_dispatcher().enable_scripts(true);
    let agent = dispatcher
        .create_from_value(&json!({ "agent_code": code }), &graph)
        .unwrap();
    let out = agent.generate_candidate(&json!([1, 2])).await.unwrap();
    assert_eq!(out, json!({"echo": [1, 2], "nodes": 1, "known": true}));
}

#[cfg(feature = "rhai")]
#[tokio::test]
async fn groovy_script_field_takes_the_script_path() {
    let dispatcher = simulated_dispatcher().enable_scripts(true);
    let agent = dispatcher
        .create_from_value(
            &json!({"name": "G", "groovyScript": "|input| input"}),
            &GraphHandle::in_memory(),
        )
        .unwrap();
    assert_eq!(agent.kind(), "script");
    assert_eq!(agent.generate_candidate(&json!([7])).await.unwrap(), json!([7]));
}

#[test]
fn groovy_script_field_needs_opt_in() {
    let err = simulated_dispatcher()
        .create_from_value(
            &json!({"name": "G", "groovyScript": "|input| input"}),
            &GraphHandle::in_memory(),
        )
        .err()
        .unwrap();
    assert!(matches!(err, AgentError::ScriptEvaluationFailure(ref m) if m.contains("disabled")));
}

// ===========================================================================
// Catalog and batch instantiation
// ===========================================================================

fn seeded_graph() -> GraphHandle {
    let graph = GraphHandle::in_memory();
    {
        let mut tx = graph.begin().unwrap();
        let cap = tx
            .create_node(&["Capability"], props(json!({"name": "rotation", "description": "d"})))
            .unwrap();
        let rot = tx
            .create_node(
                &["Agent"],
                props(json!({"name": "Rotator", "description": "d", "class": "Rotate90Agent"})),
            )
            .unwrap();
        tx.create_edge(rot, cap, "HAS_CAPABILITY", Properties::new()).unwrap();
        tx.create_node(
            &["Agent"],
            props(json!({"name": "Writer", "description": "d", "llmPrompt": "Write."})),
        )
        .unwrap();
        tx.create_node(&["Agent"], props(json!({"name": "Hollow", "description": "d"})))
            .unwrap();
        tx.commit().unwrap();
    }
    graph
}

#[test]
fn catalog_reads_agents_and_capabilities() {
    let graph = seeded_graph();
    let catalog = AgentCatalog::load(&graph).unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.names(), vec!["Rotator", "Writer", "Hollow"]);

    let rotator = catalog.get("Rotator").unwrap();
    assert_eq!(rotator.capabilities, vec!["rotation"]);
    assert_eq!(rotator.strategy.kind(), "class");
    assert!(catalog.get("Hollow").is_none());
}

#[test]
fn instantiate_all_reports_per_agent() {
    let graph = seeded_graph();
    let catalog = AgentCatalog::load(&graph).unwrap();
    let dispatcher = simulated_dispatcher();
    let outcomes = dispatcher.instantiate_all(&catalog, &graph);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert!(!outcomes[2].is_ok());
    assert!(outcomes[2].message().starts_with("Failed to create agent Hollow"));
    assert_eq!(dispatcher.usage().count("agent:Rotator"), 1);
    assert_eq!(dispatcher.usage().count("agent:Hollow"), 0);
}
