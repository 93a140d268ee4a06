//! Domain creation: LLM-generated examples stored on a new domain node.

use crate::error::{KgError, KgResult};
use crate::pipeline::KNOWLEDGE_GRAPH_LABEL;
use agentgraph_graph::{GraphHandle, GraphTransaction, Properties};
use agentgraph_llm::LlmProvider;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const DOMAIN_LABEL: &str = "Domain";

pub const CREATED_STATUS: &str = "Domain created successfully with LLM-generated examples";
pub const FAILED_STATUS: &str = "Domain creation failed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingTerms {
    #[serde(rename = "pricePerQuery", alias = "price_per_query", default)]
    pub price_per_query: f64,
    #[serde(rename = "minimumFee", alias = "minimum_fee", default)]
    pub minimum_fee: f64,
    #[serde(rename = "monthlyQuota", alias = "monthly_quota", default)]
    pub monthly_quota: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainRequest {
    #[serde(rename = "domainName", alias = "domain_name")]
    pub domain_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "llmPrompt", alias = "llm_prompt", default)]
    pub llm_prompt: String,
    #[serde(default)]
    pub billing: BillingTerms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamplePhase {
    Training,
    Evaluation,
    FinalExam,
}

impl ExamplePhase {
    pub const ALL: [ExamplePhase; 3] = [Self::Training, Self::Evaluation, Self::FinalExam];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Evaluation => "evaluation",
            Self::FinalExam => "finalExam",
        }
    }

    /// Node property holding this phase's examples.
    pub fn property(self) -> &'static str {
        match self {
            Self::Training => "training_examples",
            Self::Evaluation => "evaluation_examples",
            Self::FinalExam => "final_exam_example",
        }
    }

    fn prompt(self, req: &DomainRequest) -> String {
        let what = match self {
            Self::Training => "training examples",
            Self::Evaluation => "evaluation examples",
            Self::FinalExam => "a final exam example (in JSON format)",
        };
        format!(
            "Generate {} for the {} domain based on this prompt: {}",
            what, req.domain_name, req.llm_prompt
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainOutcome {
    pub domain: String,
    pub status: String,
}

impl DomainOutcome {
    pub fn is_created(&self) -> bool {
        self.status == CREATED_STATUS
    }
}

pub struct DomainCreator {
    llm: Arc<dyn LlmProvider>,
    graph: GraphHandle,
    model_hint: String,
}

impl DomainCreator {
    pub fn new(llm: Arc<dyn LlmProvider>, graph: GraphHandle) -> Self {
        Self {
            llm,
            graph,
            model_hint: String::new(),
        }
    }

    pub fn with_model_hint(mut self, hint: impl Into<String>) -> Self {
        self.model_hint = hint.into();
        self
    }

    /// Never fails: problems are reported through the outcome's status.
    pub async fn create(&self, req: &DomainRequest) -> DomainOutcome {
        let status = match self.try_create(req).await {
            Ok(()) => {
                info!(domain = %req.domain_name, "domain created");
                CREATED_STATUS.to_string()
            }
            Err(e) => {
                warn!(domain = %req.domain_name, error = %e, "domain creation failed");
                format!("{}: {}", FAILED_STATUS, e)
            }
        };
        DomainOutcome {
            domain: req.domain_name.clone(),
            status,
        }
    }

    async fn try_create(&self, req: &DomainRequest) -> KgResult<()> {
        if req.domain_name.trim().is_empty() {
            return Err(KgError::field("domainName", "must not be empty"));
        }
        let mut examples = Vec::with_capacity(ExamplePhase::ALL.len());
        for phase in ExamplePhase::ALL {
            let reply = self.llm.query(&phase.prompt(req), &self.model_hint).await?;
            examples.push((phase, reply.into_text()));
        }
        self.persist(req, &examples)
    }

    fn persist(&self, req: &DomainRequest, examples: &[(ExamplePhase, String)]) -> KgResult<()> {
        let mut tx = self.graph.begin()?;
        store_domain(tx.as_mut(), req, examples)?;
        tx.commit()?;
        Ok(())
    }
}

fn store_domain<'t>(
    tx: &mut (dyn GraphTransaction + 't),
    req: &DomainRequest,
    examples: &[(ExamplePhase, String)],
) -> KgResult<()> {
    let name = Value::String(req.domain_name.clone());
    if !tx.find_nodes(Some(DOMAIN_LABEL), "name", &name).is_empty() {
        return Err(KgError::Invalid(format!(
            "domain {} already exists",
            req.domain_name
        )));
    }
    let mut props = Properties::new();
    props.insert("name".into(), name);
    props.insert("description".into(), Value::String(req.description.clone()));
    for (phase, text) in examples {
        props.insert(phase.property().into(), Value::String(text.clone()));
    }
    props.insert("price_per_query".into(), Value::from(req.billing.price_per_query));
    props.insert("minimum_fee".into(), Value::from(req.billing.minimum_fee));
    props.insert("monthly_quota".into(), Value::from(req.billing.monthly_quota));
    props.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
    tx.create_node(&[KNOWLEDGE_GRAPH_LABEL, DOMAIN_LABEL], props)?;
    Ok(())
}
