// SPDX-License-Identifier: MIT

//! Compiled flows
//!
//! A [`Flow`] is a definition whose references have been parsed and whose
//! graph has been validated. It is produced by the builder and consumed by
//! the executor.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::adk::error::{ExecutionError, KineticError, WorkflowError};
use crate::kinetic::workflow::graph::{DagManager, Node};
use crate::kinetic::workflow::reference::InputAssignment;
use crate::kinetic::workflow::types::{value_kind, FlowInputDefinition, ValueType};

/// A flow output bound to a reference
#[derive(Debug, Clone)]
pub struct FlowOutput {
    /// Declared type; untyped outputs pass through unchanged
    pub value_type: Option<ValueType>,
    pub reference: InputAssignment,
}

#[derive(Debug, Clone)]
pub struct Flow {
    pub name: String,
    pub description: String,
    pub inputs: BTreeMap<String, FlowInputDefinition>,
    pub outputs: BTreeMap<String, FlowOutput>,
    /// Nodes in declaration order
    pub nodes: Vec<Node>,
}

impl Flow {
    /// Turn caller-supplied values into the run's flow inputs.
    ///
    /// Missing inputs take their default; inputs without a default are
    /// required. Values are coerced to the declared type. Undeclared values
    /// are dropped.
    pub fn prepare_inputs(
        &self,
        mut raw: Map<String, Value>,
    ) -> Result<Map<String, Value>, WorkflowError> {
        let mut prepared = Map::new();

        for (name, def) in &self.inputs {
            let value = raw
                .remove(name)
                .or_else(|| def.default.clone())
                .ok_or_else(|| WorkflowError::MissingInput(name.clone()))?;
            let coerced = def
                .value_type
                .coerce(&value)
                .ok_or_else(|| WorkflowError::InputTypeMismatch {
                    name: name.clone(),
                    expected: def.value_type.as_str().to_string(),
                    actual: value_kind(&value).to_string(),
                })?;
            prepared.insert(name.clone(), coerced);
        }

        for name in raw.keys() {
            log::warn!("Ignoring undeclared input '{}' for flow '{}'", name, self.name);
        }

        Ok(prepared)
    }

    /// Resolve every flow output against a finished run.
    ///
    /// Typed outputs are coerced to their declared type. Outputs of nodes
    /// bypassed without a value stay null.
    pub fn resolve_outputs(&self, dag: &DagManager) -> Result<Map<String, Value>, KineticError> {
        let mut outputs = Map::new();
        for (name, output) in &self.outputs {
            let value = dag.resolve_reference(name, &output.reference)?;
            let value = match output.value_type {
                Some(value_type) if !value.is_null() => {
                    value_type
                        .coerce(&value)
                        .ok_or_else(|| ExecutionError::OutputTypeMismatch {
                            name: name.clone(),
                            expected: value_type.as_str().to_string(),
                            actual: value_kind(&value).to_string(),
                        })?
                }
                _ => value,
            };
            outputs.insert(name.clone(), value);
        }
        Ok(outputs)
    }
}
