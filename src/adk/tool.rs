use async_trait::async_trait;
use serde_json::{Map, Value};
use std::error::Error;

/// Trait for tools that flow nodes execute.
///
/// `name()` and `description()` return `&str`; implementations store them in
/// struct fields.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (the value of a node's `tool` field)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Execute the tool with the node's resolved inputs and return its output
    async fn execute(&self, inputs: Map<String, Value>)
        -> Result<Value, Box<dyn Error + Send + Sync>>;
}
