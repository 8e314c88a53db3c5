//! Integration tests for flow loading, scheduling and execution
//!
//! These tests verify end-to-end flow functionality using the built-in tools
//! and mock components.

use async_trait::async_trait;
use kinetic_flow::adk::error::{DagError, ExecutionError, KineticError, WorkflowError};
use kinetic_flow::adk::tool::Tool;
use kinetic_flow::kinetic::config::ExecutorConfig;
use kinetic_flow::kinetic::tools::register_builtin_tools;
use kinetic_flow::kinetic::workflow::builder::Builder;
use kinetic_flow::kinetic::workflow::graph::{DagManager, FlowExecutor, Node, NodeState};
use kinetic_flow::kinetic::workflow::loader::FlowLoader;
use kinetic_flow::kinetic::workflow::registry::ToolRegistry;
use kinetic_flow::kinetic::workflow::run_info::{FlowRunInfo, Status};
use once_cell::sync::Lazy;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};

// ============================================================================
// Fixtures
// ============================================================================

static CONDITIONAL_FLOW: Lazy<String> = Lazy::new(|| {
    r#"
name: conditional
description: Skip, activate and bypass propagation
inputs:
  text:
    type: string
outputs:
  skipped:
    reference: ${node1.output}
  activated:
    reference: ${node2.output}
  downstream:
    reference: ${node4.output}
  final:
    reference: ${node3.output}
nodes:
  - name: node1
    tool: echo
    inputs:
      input: ${inputs.text}
    skip:
      when: ${inputs.text}
      is: hello
      return: ${inputs.text}
  - name: node2
    tool: echo
    inputs:
      input: ${inputs.text}
    activate:
      when: ${inputs.text}
      is: world
  - name: node3
    tool: prompt
    inputs:
      template: "got {{ value }}"
      value: ${node1.output}
  - name: node4
    tool: echo
    inputs:
      input: ${node2.output}
"#
    .to_string()
});

/// Mock tool that records the inputs of every call
struct RecordingTool {
    calls: Arc<Mutex<Vec<Map<String, Value>>>>,
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        "record"
    }

    fn description(&self) -> &str {
        "Records its inputs and returns them"
    }

    async fn execute(
        &self,
        inputs: Map<String, Value>,
    ) -> Result<Value, Box<dyn Error + Send + Sync>> {
        self.calls.lock().unwrap().push(inputs.clone());
        Ok(Value::Object(inputs))
    }
}

/// Mock tool that always fails
struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "flaky"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    async fn execute(
        &self,
        _inputs: Map<String, Value>,
    ) -> Result<Value, Box<dyn Error + Send + Sync>> {
        Err("upstream service unavailable".into())
    }
}

async fn builtin_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    register_builtin_tools(&registry).await;
    registry
}

async fn run_yaml(
    yaml: &str,
    registry: ToolRegistry,
    inputs: Value,
) -> Result<FlowRunInfo, KineticError> {
    let def = FlowLoader::parse_yaml(yaml)?;
    let flow = Builder::new(registry.clone()).build(&def).await?;
    let inputs = match inputs {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    FlowExecutor::new(flow, registry, ExecutorConfig::default())
        .run(inputs)
        .await
}

// ============================================================================
// Flow Execution Tests
// ============================================================================

#[tokio::test]
async fn test_conditional_flow_when_skipped() {
    let run = run_yaml(&CONDITIONAL_FLOW, builtin_registry().await, json!({"text": "hello"}))
        .await
        .unwrap();

    let node1 = run.node_run("node1").unwrap();
    assert_eq!(node1.status, Status::Bypassed);
    assert_eq!(node1.output, Some(json!("hello")));

    assert_eq!(run.node_run("node2").unwrap().status, Status::Bypassed);
    assert_eq!(run.node_run("node2").unwrap().output, None);
    assert_eq!(run.node_run("node4").unwrap().status, Status::Bypassed);
    assert_eq!(run.node_run("node3").unwrap().status, Status::Completed);

    assert_eq!(
        Value::Object(run.outputs),
        json!({
            "skipped": "hello",
            "activated": null,
            "downstream": null,
            "final": "got hello",
        })
    );
}

#[tokio::test]
async fn test_conditional_flow_when_activated() {
    let run = run_yaml(&CONDITIONAL_FLOW, builtin_registry().await, json!({"text": "world"}))
        .await
        .unwrap();

    assert!(run.node_runs.iter().all(|r| r.status == Status::Completed));
    assert_eq!(run.outputs["downstream"], json!("world"));
    assert_eq!(run.outputs["final"], json!("got world"));
}

#[tokio::test]
async fn test_run_record_serializes() {
    let run = run_yaml(&CONDITIONAL_FLOW, builtin_registry().await, json!({"text": "hello"}))
        .await
        .unwrap();

    let value = serde_json::to_value(&run).unwrap();
    assert_eq!(value["flow_name"], "conditional");
    assert_eq!(value["inputs"]["text"], "hello");
    assert_eq!(value["node_runs"].as_array().unwrap().len(), 4);
    assert!(value["run_id"].as_str().is_some());
}

#[tokio::test]
async fn test_bypassed_inputs_are_omitted() {
    let yaml = r#"
name: partial
inputs:
  mode:
    type: string
    default: "off"
nodes:
  - name: optional
    tool: echo
    inputs:
      input: enriched
    activate:
      when: ${inputs.mode}
      is: "on"
  - name: base
    tool: echo
    inputs:
      input: base
  - name: merge
    tool: record
    inputs:
      extra: ${optional.output}
      main: ${base.output}
"#;
    let calls = Arc::new(Mutex::new(Vec::new()));
    let registry = builtin_registry().await;
    registry
        .register(Arc::new(RecordingTool {
            calls: calls.clone(),
        }))
        .await;

    let run = run_yaml(yaml, registry, json!({})).await.unwrap();

    assert_eq!(run.node_run("merge").unwrap().status, Status::Completed);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(Value::Object(calls[0].clone()), json!({"main": "base"}));
}

#[tokio::test]
async fn test_skip_return_referencing_bypassed_node() {
    let yaml = r#"
name: invalid_skip
inputs:
  text:
    type: string
nodes:
  - name: node2
    tool: echo
    inputs:
      input: ${inputs.text}
    activate:
      when: ${inputs.text}
      is: world
  - name: node3
    tool: echo
    inputs:
      input: ${inputs.text}
    skip:
      when: ${inputs.text}
      is: hello
      return: ${node2.output}
"#;
    let err = run_yaml(yaml, builtin_registry().await, json!({"text": "hello"}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("The node 'node2' referenced by 'node3' has been bypassed"));
}

#[tokio::test]
async fn test_failing_tool_fails_run() {
    let yaml = r#"
name: failing
nodes:
  - name: fetch
    tool: flaky
  - name: after
    tool: echo
    inputs:
      input: ${fetch.output}
"#;
    let registry = builtin_registry().await;
    registry.register(Arc::new(FailingTool)).await;

    let err = run_yaml(yaml, registry, json!({})).await.unwrap_err();

    match err {
        KineticError::Execution(ExecutionError::NodeFailed { node, message }) => {
            assert_eq!(node, "fetch");
            assert_eq!(message, "upstream service unavailable");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_build_flow_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONDITIONAL_FLOW.as_bytes()).unwrap();

    let flow = Builder::new(builtin_registry().await)
        .build_flow(file.path())
        .await
        .unwrap();

    assert_eq!(flow.name, "conditional");
    assert_eq!(flow.nodes.len(), 4);
    assert_eq!(flow.outputs.len(), 4);
}

// ============================================================================
// Build Validation Tests
// ============================================================================

#[tokio::test]
async fn test_build_rejects_invalid_flows() {
    let builder = Builder::new(builtin_registry().await);

    let malformed = FlowLoader::parse_yaml(
        r#"
name: bad
nodes:
  - name: a
    tool: echo
    inputs:
      input: ${a.result}
"#,
    )
    .unwrap();
    assert!(matches!(
        builder.build(&malformed).await,
        Err(KineticError::Workflow(WorkflowError::InvalidReference { .. }))
    ));

    let unknown_tool = FlowLoader::parse_yaml(
        r#"
name: bad
nodes:
  - name: a
    tool: teleport
"#,
    )
    .unwrap();
    assert!(matches!(
        builder.build(&unknown_tool).await,
        Err(KineticError::ToolNotFound { .. })
    ));

    let unknown_node = FlowLoader::parse_yaml(
        r#"
name: bad
nodes:
  - name: a
    tool: echo
    inputs:
      input: ${ghost.output}
"#,
    )
    .unwrap();
    assert!(matches!(
        builder.build(&unknown_node).await,
        Err(KineticError::Workflow(WorkflowError::UnknownNodeReference { .. }))
    ));
}

// ============================================================================
// Scheduler Scenarios
// ============================================================================

fn flow_inputs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn node_names(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

#[test]
fn test_ready_nodes_follow_completion() {
    let nodes = vec![
        Node::new("node1", "echo").with_input("value", "value1").unwrap(),
        Node::new("node2", "echo").with_input("input", "${node1.output}").unwrap(),
        Node::new("node3", "echo").with_input("input", "${node1.output}").unwrap(),
    ];
    let mut dag = DagManager::new(nodes, Map::new()).unwrap();

    assert_eq!(node_names(&dag.pop_ready_nodes()), vec!["node1"]);
    assert!(dag.pop_ready_nodes().is_empty());

    dag.complete_nodes([("node1", Value::Null)]).unwrap();
    assert_eq!(node_names(&dag.pop_ready_nodes()), vec!["node2", "node3"]);
    assert!(!dag.completed());
}

#[test]
fn test_activate_bypass_propagates_downstream() {
    let nodes = vec![
        Node::new("node2", "echo")
            .with_input("input", "${inputs.text}")
            .unwrap()
            .with_activate("${inputs.text}", "world")
            .unwrap(),
        Node::new("node4", "echo").with_input("input", "${node2.output}").unwrap(),
    ];
    let mut dag = DagManager::new(nodes, flow_inputs(json!({"text": "hello"}))).unwrap();

    let mut bypassed = Vec::new();
    loop {
        let batch = dag.pop_bypassable_nodes().unwrap();
        if batch.is_empty() {
            break;
        }
        bypassed.extend(batch.into_iter().map(|n| n.name));
    }

    assert_eq!(bypassed, vec!["node2", "node4"]);
    assert_eq!(dag.get_bypassed_node_outputs("node4"), Ok(None));
    assert_eq!(dag.completed_nodes_outputs().count(), 0);
    assert!(dag.completed());
}

#[test]
fn test_complete_nodes_rejects_bypassed_node() {
    let nodes = vec![Node::new("node1", "echo")
        .with_skip("${inputs.text}", "hello", "${inputs.text}")
        .unwrap()];
    let mut dag = DagManager::new(nodes, flow_inputs(json!({"text": "hello"}))).unwrap();

    assert_eq!(node_names(&dag.pop_bypassable_nodes().unwrap()), vec!["node1"]);
    assert_eq!(
        dag.complete_nodes([("node1", json!("late"))]),
        Err(DagError::NodeAlreadyResolved("node1".to_string()))
    );
    assert_eq!(dag.get_bypassed_node_outputs("node1"), Ok(Some(&json!("hello"))));
}

// ============================================================================
// Property Tests
// ============================================================================

// Node i may only depend on nodes 0..i, so every generated graph is acyclic.
// Each node optionally carries an activate condition that is met or not.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = Vec<Node>> {
    (1..=max_nodes).prop_flat_map(|num_nodes| {
        proptest::collection::vec(
            (
                proptest::collection::vec(any::<usize>(), 0..num_nodes),
                proptest::option::of(any::<bool>()),
            ),
            num_nodes,
        )
        .prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (raw_deps, activate))| {
                    let mut node = Node::new(format!("node_{}", i), "echo");
                    if i > 0 {
                        for dep in raw_deps {
                            let dep = dep % i;
                            let reference = format!("${{node_{}.output}}", dep);
                            node = node.with_input(format!("in_{}", dep), reference).unwrap();
                        }
                    }
                    if let Some(met) = activate {
                        node = node.with_activate("${inputs.flag}", met).unwrap();
                    }
                    node
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn test_scheduler_resolves_every_node(nodes in dag_strategy(10)) {
        let total = nodes.len();
        let graph = nodes.clone();
        let mut dag = DagManager::new(nodes, flow_inputs(json!({"flag": true}))).unwrap();

        loop {
            loop {
                let bypassed = dag.pop_bypassable_nodes().unwrap();
                if bypassed.is_empty() {
                    break;
                }
                for node in &bypassed {
                    prop_assert_eq!(dag.get_bypassed_node_outputs(&node.name).unwrap(), None);
                }
            }

            let resolved = dag.completed_nodes_outputs().count() + dag.bypassed_nodes().count();
            prop_assert_eq!(dag.completed(), resolved == total);

            // Every pending node whose dependencies are resolved must be popped
            let expected: BTreeSet<String> = graph
                .iter()
                .filter(|node| dag.state(&node.name) == Some(&NodeState::Pending))
                .filter(|node| {
                    node.referenced_nodes()
                        .iter()
                        .all(|dep| dag.state(dep).is_some_and(NodeState::is_resolved))
                })
                .map(|node| node.name.clone())
                .collect();

            let ready = dag.pop_ready_nodes();
            let popped: BTreeSet<String> = ready.iter().map(|n| n.name.clone()).collect();
            prop_assert_eq!(&popped, &expected);
            if ready.is_empty() {
                break;
            }
            for node in &ready {
                for dep in node.referenced_nodes() {
                    prop_assert!(dag.state(dep).unwrap().is_resolved());
                }
            }
            prop_assert!(dag.pop_ready_nodes().is_empty());

            let outputs: Vec<(String, Value)> = ready
                .iter()
                .map(|n| (n.name.clone(), json!(n.name)))
                .collect();
            dag.complete_nodes(outputs).unwrap();
        }

        prop_assert!(dag.completed());
        prop_assert_eq!(
            dag.completed_nodes_outputs().count() + dag.bypassed_nodes().count(),
            total
        );
        for (name, _) in dag.bypassed_nodes() {
            prop_assert!(dag.completed_nodes_outputs().all(|(completed, _)| completed != name));
        }
    }

    #[test]
    fn test_matching_skip_always_bypasses(text in "[a-z]{1,6}", expected in "[a-z]{1,6}") {
        let nodes = vec![Node::new("node1", "echo")
            .with_skip("${inputs.text}", expected.clone(), "${inputs.text}")
            .unwrap()];
        let mut dag = DagManager::new(nodes, flow_inputs(json!({"text": text.clone()}))).unwrap();

        let bypassed = dag.pop_bypassable_nodes().unwrap();
        if text == expected {
            prop_assert_eq!(bypassed.len(), 1);
            let returned = json!(text);
            prop_assert_eq!(dag.get_bypassed_node_outputs("node1").unwrap(), Some(&returned));
            prop_assert!(dag.pop_ready_nodes().is_empty());
        } else {
            prop_assert!(bypassed.is_empty());
            prop_assert_eq!(dag.pop_ready_nodes().len(), 1);
        }
        prop_assert_eq!(dag.completed_nodes_outputs().count(), 0);
    }
}
