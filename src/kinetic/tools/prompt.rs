// SPDX-License-Identifier: MIT

//! Template rendering tool
//!
//! Renders the `template` parameter, replacing `{{ name }}` placeholders with
//! the node's other parameters. Strings are inserted as-is; any other value is
//! inserted as compact JSON.

use crate::adk::tool::Tool;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::error::Error;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex"));

pub struct PromptTool;

/// Render `template` against `params`
pub fn render(template: &str, params: &Map<String, Value>) -> Result<String, String> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|name| !params.contains_key(name))
    {
        return Err(format!("template references unknown parameter '{}'", missing));
    }

    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| match &params[&caps[1]] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    Ok(rendered.into_owned())
}

#[async_trait]
impl Tool for PromptTool {
    fn name(&self) -> &str {
        "prompt"
    }

    fn description(&self) -> &str {
        "Renders the `template` parameter, substituting `{{ name }}` with the other parameters."
    }

    async fn execute(
        &self,
        mut inputs: Map<String, Value>,
    ) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let template = match inputs.remove("template") {
            Some(Value::String(template)) => template,
            Some(_) => return Err("prompt 'template' must be a string".into()),
            None => return Err("prompt requires a 'template' parameter".into()),
        };

        let rendered = render(&template, &inputs)?;
        Ok(Value::String(rendered))
    }
}
