//! Compiled node types used by the scheduler
//!
//! These are the parsed, validated counterparts of the YAML node
//! definitions: every input and condition operand is already an
//! `InputAssignment`.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::adk::error::WorkflowError;
use crate::kinetic::workflow::reference::{self, InputAssignment};

/// Bypass the node when `when` equals `is`; its output becomes `return_value`
#[derive(Debug, Clone, PartialEq)]
pub struct SkipCondition {
    pub when: InputAssignment,
    pub is: Value,
    pub return_value: InputAssignment,
}

/// Bypass the node, without output, unless `when` equals `is`
#[derive(Debug, Clone, PartialEq)]
pub struct ActivateCondition {
    pub when: InputAssignment,
    pub is: Value,
}

/// A unit of work in a flow
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique name within the flow
    pub name: String,
    /// Name of the tool that executes this node
    pub tool: String,
    /// Parameter name to assignment
    pub inputs: BTreeMap<String, InputAssignment>,
    pub skip: Option<SkipCondition>,
    pub activate: Option<ActivateCondition>,
}

impl Node {
    pub fn new(name: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tool: tool.into(),
            inputs: BTreeMap::new(),
            skip: None,
            activate: None,
        }
    }

    /// Add an input, parsing `value` as a reference when it is one
    pub fn with_input(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, WorkflowError> {
        let assignment = reference::parse_value(&value.into())?;
        self.inputs.insert(name.into(), assignment);
        Ok(self)
    }

    pub fn with_skip(
        mut self,
        when: &str,
        is: impl Into<Value>,
        return_value: impl Into<Value>,
    ) -> Result<Self, WorkflowError> {
        self.skip = Some(SkipCondition {
            when: reference::parse(when)?,
            is: is.into(),
            return_value: reference::parse_value(&return_value.into())?,
        });
        Ok(self)
    }

    pub fn with_activate(
        mut self,
        when: &str,
        is: impl Into<Value>,
    ) -> Result<Self, WorkflowError> {
        self.activate = Some(ActivateCondition {
            when: reference::parse(when)?,
            is: is.into(),
        });
        Ok(self)
    }

    /// Every assignment that must be resolved before the node can run:
    /// inputs, `skip.when`, `skip.return` and `activate.when`
    pub fn dependencies(&self) -> impl Iterator<Item = &InputAssignment> {
        let skip = self
            .skip
            .iter()
            .flat_map(|s| [&s.when, &s.return_value]);
        let activate = self.activate.iter().map(|a| &a.when);
        self.inputs.values().chain(skip).chain(activate)
    }

    /// Names of the nodes this node depends on, deduplicated, in first-seen order
    pub fn referenced_nodes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.dependencies().filter_map(|d| d.referenced_node()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Resolution state of a node inside one run
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    /// Not yet scheduled
    Pending,
    /// Handed out by `pop_ready_nodes`, result not yet reported
    Running,
    /// Executed, with its output
    Completed(Value),
    /// Resolved without executing; `None` when no value was produced
    Bypassed(Option<Value>),
}

impl NodeState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, NodeState::Completed(_) | NodeState::Bypassed(_))
    }

    /// True for nodes bypassed without a usable value
    pub fn is_bypassed_without_value(&self) -> bool {
        matches!(self, NodeState::Bypassed(None))
    }

    /// The value downstream references see, if any
    pub fn output(&self) -> Option<&Value> {
        match self {
            NodeState::Completed(value) => Some(value),
            NodeState::Bypassed(value) => value.as_ref(),
            _ => None,
        }
    }
}
