//! Flow executor
//!
//! Drives a [`DagManager`] to completion: bypassable nodes are resolved
//! first, then every ready node is dispatched as one concurrent batch.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::dag_manager::DagManager;
use crate::adk::error::{ExecutionError, KineticError};
use crate::adk::tool::Tool;
use crate::kinetic::config::ExecutorConfig;
use crate::kinetic::workflow::flow::Flow;
use crate::kinetic::workflow::registry::ToolRegistry;
use crate::kinetic::workflow::run_info::{FlowRunInfo, NodeRunInfo};

/// Runs a compiled flow against a tool registry
pub struct FlowExecutor {
    flow: Flow,
    registry: ToolRegistry,
    config: ExecutorConfig,
}

impl FlowExecutor {
    pub fn new(flow: Flow, registry: ToolRegistry, config: ExecutorConfig) -> Self {
        Self {
            flow,
            registry,
            config,
        }
    }

    /// Run the flow once with the given raw inputs.
    ///
    /// The first failing node aborts the run; nodes of the same batch are
    /// allowed to finish but their results are discarded.
    pub async fn run(&self, inputs: Map<String, Value>) -> Result<FlowRunInfo, KineticError> {
        let run_id = Uuid::new_v4();
        let start_time = Utc::now();
        let flow_inputs = self.flow.prepare_inputs(inputs)?;

        log::info!(
            "Starting run {} of flow '{}' ({} nodes)",
            run_id,
            self.flow.name,
            self.flow.nodes.len()
        );

        let mut dag = DagManager::new(self.flow.nodes.clone(), flow_inputs.clone())?;
        let mut node_runs = Vec::with_capacity(self.flow.nodes.len());
        let mut iteration = 0;

        while !dag.completed() {
            iteration += 1;

            let bypassed = self.bypass_all(&mut dag, &mut node_runs)?;

            let ready = dag.pop_ready_nodes();
            if ready.is_empty() {
                if bypassed > 0 {
                    continue;
                }
                let pending: Vec<String> = dag
                    .pending_node_names()
                    .into_iter()
                    .map(String::from)
                    .collect();
                log::error!("Flow '{}' stalled with pending nodes {:?}", self.flow.name, pending);
                return Err(ExecutionError::Stalled { pending }.into());
            }

            log::info!(
                "Flow iteration {}: executing {} nodes: {:?}",
                iteration,
                ready.len(),
                ready.iter().map(|n| n.name.as_str()).collect::<Vec<_>>()
            );

            let mut jobs = Vec::with_capacity(ready.len());
            for node in &ready {
                let tool = self
                    .registry
                    .get(&node.tool)
                    .await
                    .ok_or_else(|| KineticError::tool_not_found(&node.tool))?;
                let node_inputs = dag.get_node_valid_inputs(node)?;
                jobs.push((node.name.clone(), tool, node_inputs));
            }

            let timeout = self.config.node_timeout;
            let results: Vec<Result<NodeRunInfo, ExecutionError>> = stream::iter(jobs)
                .map(|(name, tool, node_inputs)| execute_node(name, tool, node_inputs, timeout))
                .buffered(self.config.max_concurrency.max(1))
                .collect()
                .await;

            let mut outputs = Vec::with_capacity(results.len());
            for result in results {
                let run = result?;
                outputs.push((run.node.clone(), run.output.clone().unwrap_or(Value::Null)));
                node_runs.push(run);
            }
            dag.complete_nodes(outputs)?;
        }

        let outputs = self.flow.resolve_outputs(&dag)?;
        let end_time = Utc::now();
        log::info!(
            "Run {} of flow '{}' finished in {} ms",
            run_id,
            self.flow.name,
            (end_time - start_time).num_milliseconds()
        );

        Ok(FlowRunInfo {
            run_id,
            flow_name: self.flow.name.clone(),
            inputs: flow_inputs,
            outputs,
            node_runs,
            start_time,
            end_time,
        })
    }

    /// Pop bypassable nodes until none are left; returns how many were bypassed
    fn bypass_all(
        &self,
        dag: &mut DagManager,
        node_runs: &mut Vec<NodeRunInfo>,
    ) -> Result<usize, KineticError> {
        let mut count = 0;
        loop {
            let bypassed = dag.pop_bypassable_nodes()?;
            if bypassed.is_empty() {
                return Ok(count);
            }
            let now = Utc::now();
            for node in bypassed {
                let output = dag.get_bypassed_node_outputs(&node.name)?.cloned();
                log::info!("Node {} bypassed", node.name);
                node_runs.push(NodeRunInfo::bypassed(node.name, output, now));
                count += 1;
            }
        }
    }
}

/// Execute a single node and return its run record
async fn execute_node(
    node: String,
    tool: Arc<dyn Tool>,
    inputs: Map<String, Value>,
    timeout: Option<Duration>,
) -> Result<NodeRunInfo, ExecutionError> {
    let start_time = Utc::now();
    log::info!("Executing node: {} ({})", node, tool.name());

    let call = tool.execute(inputs.clone());
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                log::error!("Node {} timed out after {:?}", node, limit);
                return Err(ExecutionError::NodeTimeout {
                    node,
                    timeout: limit,
                });
            }
        },
        None => call.await,
    };

    match result {
        Ok(output) => {
            log::info!("Node {} completed", node);
            Ok(NodeRunInfo::completed(node, inputs, output, start_time))
        }
        Err(e) => {
            log::error!("Node {} failed: {}", node, e);
            Err(ExecutionError::NodeFailed {
                node,
                message: e.to_string(),
            })
        }
    }
}
