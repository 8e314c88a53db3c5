// SPDX-License-Identifier: MIT

//! Run records produced by the executor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// How a node was resolved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Completed,
    Bypassed,
}

/// Record of one node in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRunInfo {
    pub node: String,
    pub status: Status,
    /// Resolved inputs the tool received (empty for bypassed nodes)
    pub inputs: Map<String, Value>,
    /// Tool output, or the bypass return value
    pub output: Option<Value>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NodeRunInfo {
    pub fn completed(
        node: impl Into<String>,
        inputs: Map<String, Value>,
        output: Value,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            node: node.into(),
            status: Status::Completed,
            inputs,
            output: Some(output),
            start_time,
            end_time: Utc::now(),
        }
    }

    pub fn bypassed(node: impl Into<String>, output: Option<Value>, at: DateTime<Utc>) -> Self {
        Self {
            node: node.into(),
            status: Status::Bypassed,
            inputs: Map::new(),
            output,
            start_time: at,
            end_time: at,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

/// Record of a whole flow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRunInfo {
    pub run_id: Uuid,
    pub flow_name: String,
    pub inputs: Map<String, Value>,
    pub outputs: Map<String, Value>,
    /// Node records in resolution order
    pub node_runs: Vec<NodeRunInfo>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl FlowRunInfo {
    pub fn node_run(&self, name: &str) -> Option<&NodeRunInfo> {
        self.node_runs.iter().find(|run| run.node == name)
    }
}
