// SPDX-License-Identifier: MIT

//! DAG manager - the scheduling state machine for one flow run
//!
//! The manager owns the resolution state of every node. An orchestrator
//! drives it in a loop:
//!
//! 1. call [`DagManager::pop_bypassable_nodes`] until it returns nothing,
//! 2. dispatch everything from [`DagManager::pop_ready_nodes`],
//! 3. report results through [`DagManager::complete_nodes`],
//!
//! until [`DagManager::completed`] is true. Nodes are always visited in
//! declaration order, so each call is deterministic for a given state.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use super::types::{Node, NodeState};
use crate::adk::error::DagError;
use crate::kinetic::workflow::reference::{resolve_path, values_equal, InputAssignment};

pub struct DagManager {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    states: Vec<NodeState>,
    flow_inputs: Map<String, Value>,
}

impl DagManager {
    /// Create a manager with every node pending.
    ///
    /// Fails on duplicate node names and on references to nodes that are
    /// not part of `nodes`.
    pub fn new(nodes: Vec<Node>, flow_inputs: Map<String, Value>) -> Result<Self, DagError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name.clone(), i).is_some() {
                return Err(DagError::DuplicateNode(node.name.clone()));
            }
        }

        for node in &nodes {
            if let Some(missing) = node
                .referenced_nodes()
                .into_iter()
                .find(|name| !index.contains_key(*name))
            {
                return Err(DagError::UnknownNode(missing.to_string()));
            }
        }

        let states = vec![NodeState::Pending; nodes.len()];
        Ok(Self {
            nodes,
            index,
            states,
            flow_inputs,
        })
    }

    /// Current state of a node
    pub fn state(&self, name: &str) -> Option<&NodeState> {
        self.index.get(name).map(|&i| &self.states[i])
    }

    /// Return and mark running every pending node whose dependencies are all
    /// resolved. Skip/activate conditions are not evaluated here.
    pub fn pop_ready_nodes(&mut self) -> Vec<Node> {
        let ready: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.states[i] == NodeState::Pending && self.is_ready(&self.nodes[i]))
            .collect();

        ready
            .into_iter()
            .map(|i| {
                self.states[i] = NodeState::Running;
                log::debug!("Node {} is ready", self.nodes[i].name);
                self.nodes[i].clone()
            })
            .collect()
    }

    /// Return and resolve every pending node that must be bypassed.
    ///
    /// One pass in declaration order; a bypass is visible to the nodes after
    /// it in the same pass. Callers loop until the result is empty.
    pub fn pop_bypassable_nodes(&mut self) -> Result<Vec<Node>, DagError> {
        let mut bypassed = Vec::new();

        for i in 0..self.nodes.len() {
            if self.states[i] != NodeState::Pending || !self.is_ready(&self.nodes[i]) {
                continue;
            }

            if let Some(output) = self.bypass_output(&self.nodes[i])? {
                log::debug!(
                    "Node {} bypassed with {}",
                    self.nodes[i].name,
                    if output.is_some() { "a return value" } else { "no value" }
                );
                self.states[i] = NodeState::Bypassed(output);
                bypassed.push(self.nodes[i].clone());
            }
        }

        Ok(bypassed)
    }

    /// Record nodes as completed with their outputs.
    ///
    /// The batch is checked before any state changes: unknown names and
    /// nodes that are already completed or bypassed are rejected.
    pub fn complete_nodes<I, K>(&mut self, outputs: I) -> Result<(), DagError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut updates = Vec::new();
        let mut seen = HashSet::new();

        for (name, output) in outputs {
            let name = name.as_ref();
            let &i = self
                .index
                .get(name)
                .ok_or_else(|| DagError::UnknownNode(name.to_string()))?;
            if self.states[i].is_resolved() || !seen.insert(i) {
                return Err(DagError::NodeAlreadyResolved(name.to_string()));
            }
            updates.push((i, output));
        }

        for (i, output) in updates {
            log::debug!("Node {} completed", self.nodes[i].name);
            self.states[i] = NodeState::Completed(output);
        }

        Ok(())
    }

    /// True once every node is completed or bypassed
    pub fn completed(&self) -> bool {
        self.states.iter().all(NodeState::is_resolved)
    }

    /// Resolve the node's inputs into concrete values.
    ///
    /// Inputs that reference a node bypassed without a value are left out.
    pub fn get_node_valid_inputs(&self, node: &Node) -> Result<Map<String, Value>, DagError> {
        let mut inputs = Map::new();
        for (name, assignment) in &node.inputs {
            if self.is_bypassed_without_value(assignment) {
                continue;
            }
            inputs.insert(name.clone(), self.resolve(&node.name, assignment)?);
        }
        Ok(inputs)
    }

    /// The recorded output of a bypassed node (`None` when it has none)
    pub fn get_bypassed_node_outputs(&self, name: &str) -> Result<Option<&Value>, DagError> {
        match self.state(name) {
            Some(NodeState::Bypassed(output)) => Ok(output.as_ref()),
            Some(_) => Err(DagError::NodeNotBypassed(name.to_string())),
            None => Err(DagError::UnknownNode(name.to_string())),
        }
    }

    /// Outputs of executed nodes, in declaration order
    pub fn completed_nodes_outputs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.nodes
            .iter()
            .zip(&self.states)
            .filter_map(|(node, state)| match state {
                NodeState::Completed(value) => Some((node.name.as_str(), value)),
                _ => None,
            })
    }

    /// Bypassed nodes and their outputs, in declaration order
    pub fn bypassed_nodes(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.nodes
            .iter()
            .zip(&self.states)
            .filter_map(|(node, state)| match state {
                NodeState::Bypassed(value) => Some((node.name.as_str(), value.as_ref())),
                _ => None,
            })
    }

    /// The value downstream references see for a node, completed or bypassed
    pub fn node_output(&self, name: &str) -> Option<&Value> {
        self.state(name).and_then(NodeState::output)
    }

    /// Names of nodes that are not resolved yet (pending or running)
    pub fn pending_node_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .zip(&self.states)
            .filter(|(_, state)| !state.is_resolved())
            .map(|(node, _)| node.name.as_str())
            .collect()
    }

    /// Resolve a flow-level reference once the run is over. A reference to
    /// a node bypassed without a value yields `null`.
    pub fn resolve_reference(
        &self,
        owner: &str,
        assignment: &InputAssignment,
    ) -> Result<Value, DagError> {
        if self.is_bypassed_without_value(assignment) {
            return Ok(Value::Null);
        }
        self.resolve(owner, assignment)
    }

    fn is_ready(&self, node: &Node) -> bool {
        node.dependencies()
            .filter_map(InputAssignment::referenced_node)
            .all(|name| self.state(name).is_some_and(NodeState::is_resolved))
    }

    fn is_bypassed_without_value(&self, assignment: &InputAssignment) -> bool {
        assignment
            .referenced_node()
            .and_then(|name| self.state(name))
            .is_some_and(NodeState::is_bypassed_without_value)
    }

    /// `Some(output)` when the node must be bypassed, `None` when it must run
    fn bypass_output(&self, node: &Node) -> Result<Option<Option<Value>>, DagError> {
        if let Some(skip) = &node.skip {
            if !self.is_bypassed_without_value(&skip.when)
                && values_equal(&self.resolve(&node.name, &skip.when)?, &skip.is)
            {
                let output = self.resolve(&node.name, &skip.return_value)?;
                return Ok(Some(Some(output)));
            }
        }

        if let Some(activate) = &node.activate {
            if self.is_bypassed_without_value(&activate.when) {
                return Ok(Some(None));
            }
            let value = self.resolve(&node.name, &activate.when)?;
            if values_equal(&value, &activate.is) {
                return Ok(None);
            }
            return Ok(Some(None));
        }

        let mut references = node
            .inputs
            .values()
            .filter(|assignment| assignment.referenced_node().is_some())
            .peekable();
        if references.peek().is_none() {
            return Ok(None);
        }
        if references.all(|assignment| self.is_bypassed_without_value(assignment)) {
            return Ok(Some(None));
        }
        Ok(None)
    }

    /// Resolve one assignment on behalf of `owner`
    fn resolve(&self, owner: &str, assignment: &InputAssignment) -> Result<Value, DagError> {
        match assignment {
            InputAssignment::Literal(value) => Ok(value.clone()),
            InputAssignment::FlowInput { name, path } => {
                let value = self
                    .flow_inputs
                    .get(name)
                    .ok_or_else(|| DagError::FlowInputNotFound {
                        node: owner.to_string(),
                        input: name.clone(),
                    })?;
                resolve_path(value, path)
                    .cloned()
                    .ok_or_else(|| DagError::PropertyNotFound {
                        node: owner.to_string(),
                        expression: assignment.to_string(),
                    })
            }
            InputAssignment::NodeOutput { node, path } => {
                let value = match self.state(node) {
                    None => return Err(DagError::UnknownNode(node.clone())),
                    Some(NodeState::Bypassed(None)) => {
                        return Err(DagError::ReferenceNodeBypassed {
                            node: owner.to_string(),
                            reference: node.clone(),
                        })
                    }
                    Some(state) => state.output().ok_or_else(|| DagError::DependencyNotResolved {
                        node: owner.to_string(),
                        reference: node.clone(),
                    })?,
                };
                resolve_path(value, path)
                    .cloned()
                    .ok_or_else(|| DagError::PropertyNotFound {
                        node: owner.to_string(),
                        expression: assignment.to_string(),
                    })
            }
        }
    }
}
