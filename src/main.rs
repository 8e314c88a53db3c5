use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

use kinetic_flow::kinetic::config::ExecutorConfig;
use kinetic_flow::kinetic::tools::register_builtin_tools;
use kinetic_flow::kinetic::workflow::builder::Builder;
use kinetic_flow::kinetic::workflow::graph::FlowExecutor;
use kinetic_flow::kinetic::workflow::registry::ToolRegistry;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a flow and print the run record as JSON
    Run {
        /// Path to the flow file
        #[arg(short, long)]
        flow: PathBuf,

        /// Flow input as key=value, may be repeated
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, String)>,

        /// Override KINETIC_MAX_CONCURRENCY
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Override KINETIC_NODE_TIMEOUT_SECS
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Load and validate a flow without running it
    Validate {
        /// Path to the flow file
        #[arg(short, long)]
        flow: PathBuf,
    },
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let registry = ToolRegistry::new();
    register_builtin_tools(&registry).await;
    log::info!("Registered tools: {:?}", registry.names().await);

    let builder = Builder::new(registry.clone());

    match args.command {
        Commands::Run {
            flow,
            inputs,
            max_concurrency,
            timeout_secs,
        } => {
            let mut config = ExecutorConfig::from_env()?;
            if let Some(max_concurrency) = max_concurrency {
                if max_concurrency == 0 {
                    return Err(anyhow!("--max-concurrency must be at least 1"));
                }
                config.max_concurrency = max_concurrency;
            }
            if let Some(secs) = timeout_secs {
                config.node_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }

            let compiled = builder
                .build_flow(&flow)
                .await
                .with_context(|| format!("failed to build flow {}", flow.display()))?;

            let raw_inputs: Map<String, Value> = inputs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();

            let executor = FlowExecutor::new(compiled, registry, config);
            let run = executor.run(raw_inputs).await?;
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Commands::Validate { flow } => {
            let compiled = builder
                .build_flow(&flow)
                .await
                .with_context(|| format!("failed to build flow {}", flow.display()))?;
            println!(
                "Flow '{}' is valid: {} nodes, {} inputs, {} outputs",
                compiled.name,
                compiled.nodes.len(),
                compiled.inputs.len(),
                compiled.outputs.len()
            );
        }
    }

    Ok(())
}
