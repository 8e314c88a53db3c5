// SPDX-License-Identifier: MIT

//! YAML schema types for flow definitions
//!
//! This module contains the data structures used for parsing flow YAML
//! files. Values are kept raw here; the builder parses references.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level flow definition
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlowDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Declared flow inputs
    #[serde(default)]
    pub inputs: BTreeMap<String, FlowInputDefinition>,
    /// Flow outputs, each referencing a node output
    #[serde(default)]
    pub outputs: BTreeMap<String, FlowOutputDefinition>,
    /// Nodes, in declaration order
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

/// A declared flow input
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlowInputDefinition {
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    /// Used when the caller does not supply the input; inputs without a
    /// default are required
    pub default: Option<Value>,
    #[serde(default)]
    pub description: String,
}

/// A flow output
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlowOutputDefinition {
    /// When set, the resolved value is coerced to this type
    #[serde(rename = "type", default)]
    pub value_type: Option<ValueType>,
    /// `${node.output...}` or `${inputs.x}`
    pub reference: Value,
    #[serde(default)]
    pub description: String,
}

/// A node in the flow
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeDefinition {
    /// Unique node name
    pub name: String,
    /// Tool that executes the node
    pub tool: String,
    /// Parameter name to literal or reference
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    /// Bypass with a return value when the condition matches
    pub skip: Option<SkipConfig>,
    /// Bypass without a value unless the condition matches
    pub activate: Option<ActivateConfig>,
}

/// `skip: { when, is, return }`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SkipConfig {
    pub when: String,
    pub is: Value,
    #[serde(rename = "return")]
    pub return_value: Value,
}

/// `activate: { when, is }`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ActivateConfig {
    pub when: String,
    pub is: Value,
}

/// Supported flow input/output types
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Double,
    Bool,
    List,
    Object,
}

impl ValueType {
    /// Coerce `value` to this type.
    ///
    /// Values already of the right type pass through; strings are parsed
    /// (numbers, booleans, JSON lists/objects). Returns `None` when the
    /// value cannot be represented.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ValueType::String, Value::String(_)) => Some(value.clone()),
            (ValueType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ValueType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (ValueType::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
            (ValueType::Int, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (ValueType::Double, Value::Number(n)) => n.as_f64().map(Value::from),
            (ValueType::Double, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::from),
            (ValueType::Bool, Value::Bool(_)) => Some(value.clone()),
            (ValueType::Bool, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (ValueType::List, Value::Array(_)) => Some(value.clone()),
            (ValueType::Object, Value::Object(_)) => Some(value.clone()),
            (ValueType::List | ValueType::Object, Value::String(s)) => {
                serde_json::from_str::<Value>(s)
                    .ok()
                    .and_then(|parsed| self.coerce(&parsed))
                    .filter(|parsed| !parsed.is_string())
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Double => "double",
            ValueType::Bool => "bool",
            ValueType::List => "list",
            ValueType::Object => "object",
        }
    }
}

/// Short name of a JSON value's type, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
