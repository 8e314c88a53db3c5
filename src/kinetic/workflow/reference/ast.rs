// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for input assignments

use serde_json::Value;
use std::fmt;

/// The value bound to a node parameter or a condition operand
#[derive(Debug, Clone, PartialEq)]
pub enum InputAssignment {
    /// Any value that is not a reference
    Literal(Value),
    /// `${inputs.<name>}` with an optional path into the input value
    FlowInput { name: String, path: Vec<PathSegment> },
    /// `${<node>.output}` with an optional path into the node output
    NodeOutput { node: String, path: Vec<PathSegment> },
}

/// One step of a path into a JSON value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.key`
    Key(String),
    /// `[n]` or `.n`
    Index(usize),
}

impl InputAssignment {
    /// Name of the node this assignment reads from, if any
    pub fn referenced_node(&self) -> Option<&str> {
        match self {
            InputAssignment::NodeOutput { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Name of the flow input this assignment reads from, if any
    pub fn referenced_input(&self) -> Option<&str> {
        match self {
            InputAssignment::FlowInput { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, InputAssignment::Literal(_))
    }
}

impl From<Value> for InputAssignment {
    fn from(value: Value) -> Self {
        InputAssignment::Literal(value)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, ".{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &[PathSegment]) -> fmt::Result {
    for segment in path {
        write!(f, "{}", segment)?;
    }
    Ok(())
}

impl fmt::Display for InputAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputAssignment::Literal(Value::String(s)) => write!(f, "{}", s),
            InputAssignment::Literal(value) => write!(f, "{}", value),
            InputAssignment::FlowInput { name, path } => {
                write!(f, "${{inputs.{}", name)?;
                write_path(f, path)?;
                write!(f, "}}")
            }
            InputAssignment::NodeOutput { node, path } => {
                write!(f, "${{{}.output", node)?;
                write_path(f, path)?;
                write!(f, "}}")
            }
        }
    }
}
