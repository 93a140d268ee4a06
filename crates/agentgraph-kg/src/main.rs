//! agentgraph-kg CLI - load knowledge-graph documents and run their agents.
//!
//! The graph lives in memory for the duration of one command, so every
//! command that needs agents loads its documents first.

use agentgraph_agent::{AgentCatalog, Dispatcher};
use agentgraph_core::{Properties, Settings};
use agentgraph_graph::GraphHandle;
use agentgraph_kg::{
    AgentAuthor, AgentKind, BillingTerms, DocumentSource, DomainCreator, DomainRequest,
    IngestionPipeline, QueryAssistant,
};
use agentgraph_llm::{LlmClient, LlmProvider};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "agentgraph-kg",
    version = env!("CARGO_PKG_VERSION"),
    about = "Knowledge-graph loader and agent runner"
)]
struct Cli {
    /// Override a setting (repeatable), e.g. --set llm.model=gpt-4o
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    set: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SourceArgs {
    /// Document files or directories
    paths: Vec<PathBuf>,

    /// Use the built-in documents (the default when no paths are given)
    #[arg(long)]
    bundled: bool,
}

impl SourceArgs {
    fn source(&self) -> DocumentSource {
        if self.bundled || self.paths.is_empty() {
            DocumentSource::bundled()
        } else {
            DocumentSource::from_paths(self.paths.clone())
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List the documents a load would read
    List(SourceArgs),

    /// Validate and load documents, then print the report
    Load {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the full report as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Load documents, instantiate one agent and run it on an input
    RunAgent {
        /// Agent name as it appears in the documents
        #[arg(long)]
        agent: String,

        /// Input as JSON (plain text is passed as a string)
        #[arg(long)]
        input: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Turn a natural-language request into a graph query
    Query { prompt: String },

    /// Create a domain with LLM-generated examples
    CreateDomain {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Prompt the examples are generated from
        #[arg(long, default_value = "")]
        prompt: String,

        #[arg(long, default_value_t = 0.0)]
        price_per_query: f64,

        #[arg(long, default_value_t = 0.0)]
        minimum_fee: f64,

        #[arg(long, default_value_t = 0)]
        monthly_quota: u64,
    },

    /// Draft an agent from a description and store it
    Author {
        description: String,

        /// llm or script
        #[arg(long = "type", default_value = "llm")]
        kind: String,
    },
}

fn load(pipeline: &IngestionPipeline, source: &DocumentSource) -> anyhow::Result<()> {
    let report = pipeline.ingest_source(source)?;
    for line in report.messages() {
        tracing::info!("{}", line);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentgraph_kg=info,agentgraph_llm=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let settings = Settings::from_environment(Properties::from_assignments(&cli.set)?)?;
    let llm: Arc<dyn LlmProvider> = Arc::new(LlmClient::new(settings.llm.clone())?);
    let graph = GraphHandle::in_memory();

    match cli.command {
        Command::List(args) => {
            for name in args.source().list() {
                println!("{}", name);
            }
        }

        Command::Load { source, yaml } => {
            let report = IngestionPipeline::new(graph.clone()).ingest_source(&source.source())?;
            if yaml {
                print!("{}", report.to_yaml()?);
            } else {
                for line in report.messages() {
                    println!("{}", line);
                }
            }
        }

        Command::RunAgent {
            agent,
            input,
            source,
        } => {
            let dispatcher = Dispatcher::from_settings(&settings, llm.clone());
            let pipeline =
                IngestionPipeline::new(graph.clone()).with_usage(dispatcher.usage().clone());
            load(&pipeline, &source.source())?;

            let catalog = AgentCatalog::load(&graph)?;
            let definition = catalog.get(&agent).ok_or_else(|| {
                anyhow::anyhow!(
                    "agent {} not found (known: {})",
                    agent,
                    catalog.names().join(", ")
                )
            })?;
            let runnable = dispatcher.create_agent(definition, &graph)?;
            let input = serde_json::from_str(&input)
                .unwrap_or_else(|_| serde_json::Value::String(input.clone()));
            let candidate = runnable.generate_candidate(&input).await?;
            println!("{}", serde_json::to_string_pretty(&candidate)?);
            tracing::debug!("{}", dispatcher.usage().report());
        }

        Command::Query { prompt } => {
            let query = QueryAssistant::new(llm.clone()).generate_query(&prompt).await?;
            println!("{}", query);
        }

        Command::CreateDomain {
            name,
            description,
            prompt,
            price_per_query,
            minimum_fee,
            monthly_quota,
        } => {
            let request = DomainRequest {
                domain_name: name,
                description,
                llm_prompt: prompt,
                billing: BillingTerms {
                    price_per_query,
                    minimum_fee,
                    monthly_quota,
                },
            };
            let outcome = DomainCreator::new(llm.clone(), graph.clone()).create(&request).await;
            println!("{}: {}", outcome.domain, outcome.status);
        }

        Command::Author { description, kind } => {
            let kind: AgentKind = kind.parse()?;
            let outcome = AgentAuthor::new(llm.clone(), graph.clone())
                .create_from_description(&description, kind)
                .await;
            println!("{}", outcome.message);
            if let Some(agent) = outcome.agent {
                println!("{}", serde_json::to_string_pretty(&agent)?);
            }
        }
    }

    Ok(())
}
