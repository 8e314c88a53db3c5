// SPDX-License-Identifier: MIT

//! Built-in tools

pub mod echo;
pub mod prompt;

use crate::adk::tool::Tool;
use crate::kinetic::workflow::registry::ToolRegistry;
use std::sync::Arc;

pub fn create_tools() -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(echo::EchoTool), Arc::new(prompt::PromptTool)]
}

/// Register every built-in tool
pub async fn register_builtin_tools(registry: &ToolRegistry) {
    for tool in create_tools() {
        registry.register(tool).await;
    }
}
