// SPDX-License-Identifier: MIT

//! Typed error handling for kinetic-flow
//!
//! Errors are split by the layer that raises them: flow definitions
//! (`WorkflowError`), the DAG scheduler (`DagError`) and the run loop
//! (`ExecutionError`). `KineticError` wraps all of them at the top level.

use thiserror::Error;

/// Top-level error type for kinetic-flow
#[derive(Debug, Error)]
pub enum KineticError {
    /// Tool not found during build or execution
    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },

    /// Configuration errors (invalid env vars, bad CLI values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Flow definition errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Scheduler errors
    #[error(transparent)]
    Dag(#[from] DagError),

    /// Run-level failures
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper for compatibility
    #[error("{0}")]
    Other(String),
}

/// Errors in a flow definition, raised while loading or compiling it
#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    /// File not found when loading a flow
    #[error("Flow file not found: {0}")]
    FileNotFound(String),

    /// A `${...}` expression that does not parse
    #[error("Invalid reference '{expression}': {reason}")]
    InvalidReference { expression: String, reason: String },

    /// Two nodes share a name
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    /// A node references a node that is not part of the flow
    #[error("Node '{node}' references unknown node '{reference}'")]
    UnknownNodeReference { node: String, reference: String },

    /// A node references its own output
    #[error("Node '{0}' references its own output")]
    SelfReference(String),

    /// A `${inputs.x}` reference to an input the flow does not declare
    #[error("'{owner}' references undeclared flow input '{input}'")]
    UnknownFlowInput { owner: String, input: String },

    /// A flow output references a node that is not part of the flow
    #[error("Flow output '{output}' references unknown node '{reference}'")]
    UnknownOutputReference { output: String, reference: String },

    /// Circular dependency detected in the graph
    #[error("Circular dependency detected: {0:?}")]
    CircularDependency(Vec<String>),

    /// A required flow input was not supplied
    #[error("Missing required flow input: {0}")]
    MissingInput(String),

    /// A flow input value does not match its declared type
    #[error("Flow input '{name}' expects type {expected}, got {actual}")]
    InputTypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

/// Errors raised by the DAG manager
#[derive(Debug, Error, PartialEq)]
pub enum DagError {
    /// A concrete value was required from a node that was bypassed without one
    #[error(
        "The node '{reference}' referenced by '{node}' has been bypassed, so the node cannot \
         return valid value. Please refer to the node that will not be bypassed as the return \
         value of skip config."
    )]
    ReferenceNodeBypassed { node: String, reference: String },

    /// A reference points to a node that has not been resolved yet
    #[error("Node '{node}' depends on '{reference}', which has not been resolved yet")]
    DependencyNotResolved { node: String, reference: String },

    /// A reference path does not exist in the referenced value
    #[error("Node '{node}' references '{expression}', which does not exist")]
    PropertyNotFound { node: String, expression: String },

    /// A flow input referenced by a node was not supplied
    #[error("Node '{node}' references flow input '{input}', which was not supplied")]
    FlowInputNotFound { node: String, input: String },

    /// The node name is not part of the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Two nodes share a name
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    /// The node was already completed or bypassed
    #[error("Node '{0}' has already been resolved")]
    NodeAlreadyResolved(String),

    /// The node was not bypassed
    #[error("Node '{0}' has not been bypassed")]
    NodeNotBypassed(String),
}

/// Run-level failures reported by the executor
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A tool returned an error
    #[error("Node '{node}' failed: {message}")]
    NodeFailed { node: String, message: String },

    /// A node exceeded the configured timeout
    #[error("Node '{node}' timed out after {timeout:?}")]
    NodeTimeout {
        node: String,
        timeout: std::time::Duration,
    },

    /// A resolved flow output does not match its declared type
    #[error("Flow output '{name}' expects type {expected}, got {actual}")]
    OutputTypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// No node could be bypassed or dispatched, yet the graph is incomplete
    #[error("Flow stalled with pending nodes: {pending:?}")]
    Stalled { pending: Vec<String> },
}

impl KineticError {
    /// Create a tool not found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for KineticError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for KineticError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for KineticError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err.to_string())
    }
}
