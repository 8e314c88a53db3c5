// SPDX-License-Identifier: MIT

use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::error::Error;

/// Returns its `input` parameter unchanged
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Returns the `input` parameter unchanged."
    }

    async fn execute(
        &self,
        mut inputs: Map<String, Value>,
    ) -> Result<Value, Box<dyn Error + Send + Sync>> {
        inputs
            .remove("input")
            .ok_or_else(|| "echo requires an 'input' parameter".into())
    }
}
