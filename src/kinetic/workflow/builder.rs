// SPDX-License-Identifier: MIT

//! Flow builder - orchestrates flow construction
//!
//! This module provides the high-level Builder that loads flow definitions,
//! compiles them into [`Flow`]s and checks them against a tool registry.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::adk::error::{KineticError, WorkflowError};
use crate::kinetic::workflow::flow::{Flow, FlowOutput};
use crate::kinetic::workflow::graph::{validate_nodes, Node};
use crate::kinetic::workflow::loader::FlowLoader;
use crate::kinetic::workflow::reference;
use crate::kinetic::workflow::registry::ToolRegistry;
use crate::kinetic::workflow::types::{FlowDefinition, NodeDefinition};

/// High-level builder for constructing flows from YAML definitions
pub struct Builder {
    loader: FlowLoader,
    registry: ToolRegistry,
}

impl Builder {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            loader: FlowLoader::new(),
            registry,
        }
    }

    /// Build a flow from a YAML file path
    pub async fn build_flow<P: AsRef<Path>>(&self, path: P) -> Result<Flow, KineticError> {
        let def = self.loader.load_flow(path)?;
        self.build(&def).await
    }

    /// Build a flow from a parsed definition
    pub async fn build(&self, def: &FlowDefinition) -> Result<Flow, KineticError> {
        let flow = compile(def)?;

        for node in &flow.nodes {
            if !self.registry.contains(&node.tool).await {
                log::error!("Node {} uses unregistered tool {}", node.name, node.tool);
                return Err(KineticError::tool_not_found(&node.tool));
            }
        }

        log::info!(
            "Built flow '{}' with {} nodes, {} inputs and {} outputs",
            flow.name,
            flow.nodes.len(),
            flow.inputs.len(),
            flow.outputs.len()
        );

        Ok(flow)
    }
}

/// Parse every reference in `def` and validate the resulting graph.
///
/// Tool names are not checked here; [`Builder::build`] does that.
pub fn compile(def: &FlowDefinition) -> Result<Flow, WorkflowError> {
    let nodes = def
        .nodes
        .iter()
        .map(compile_node)
        .collect::<Result<Vec<_>, _>>()?;

    let declared: HashSet<&str> = def.inputs.keys().map(String::as_str).collect();
    validate_nodes(&nodes, &declared)?;

    let node_names: HashSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    let mut outputs = BTreeMap::new();
    for (name, output_def) in &def.outputs {
        let assignment = reference::parse_value(&output_def.reference)?;
        if let Some(node) = assignment.referenced_node() {
            if !node_names.contains(node) {
                return Err(WorkflowError::UnknownOutputReference {
                    output: name.clone(),
                    reference: node.to_string(),
                });
            }
        }
        if let Some(input) = assignment.referenced_input() {
            if !declared.contains(input) {
                return Err(WorkflowError::UnknownFlowInput {
                    owner: name.clone(),
                    input: input.to_string(),
                });
            }
        }
        outputs.insert(
            name.clone(),
            FlowOutput {
                value_type: output_def.value_type,
                reference: assignment,
            },
        );
    }

    Ok(Flow {
        name: def.name.clone(),
        description: def.description.clone(),
        inputs: def.inputs.clone(),
        outputs,
        nodes,
    })
}

fn compile_node(def: &NodeDefinition) -> Result<Node, WorkflowError> {
    let mut node = Node::new(def.name.as_str(), def.tool.as_str());
    for (name, value) in &def.inputs {
        node = node.with_input(name.as_str(), value.clone())?;
    }
    if let Some(skip) = &def.skip {
        node = node.with_skip(&skip.when, skip.is.clone(), skip.return_value.clone())?;
    }
    if let Some(activate) = &def.activate {
        node = node.with_activate(&activate.when, activate.is.clone())?;
    }
    Ok(node)
}
