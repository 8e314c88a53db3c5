//! Structural validation of compiled flows
//!
//! Validates:
//! - node names are unique
//! - node references point to known nodes, never to the node itself
//! - `${inputs.x}` references point to declared inputs
//! - the dependency graph is acyclic

use std::collections::{HashMap, HashSet};

use super::types::Node;
use crate::adk::error::WorkflowError;

/// Validate a node list against the set of declared flow inputs
pub fn validate_nodes(
    nodes: &[Node],
    declared_inputs: &HashSet<&str>,
) -> Result<(), WorkflowError> {
    let mut names: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !names.insert(node.name.as_str()) {
            return Err(WorkflowError::DuplicateNode(node.name.clone()));
        }
    }

    for node in nodes {
        for dependency in node.dependencies() {
            if let Some(reference) = dependency.referenced_node() {
                if reference == node.name {
                    return Err(WorkflowError::SelfReference(node.name.clone()));
                }
                if !names.contains(reference) {
                    return Err(WorkflowError::UnknownNodeReference {
                        node: node.name.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
            if let Some(input) = dependency.referenced_input() {
                if !declared_inputs.contains(input) {
                    return Err(WorkflowError::UnknownFlowInput {
                        owner: node.name.clone(),
                        input: input.to_string(),
                    });
                }
            }
        }
    }

    if let Some(cycle) = find_cycle(nodes) {
        return Err(WorkflowError::CircularDependency(cycle));
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Return one dependency cycle as a path of node names, first node repeated
/// at the end, or `None` when the graph is acyclic
pub fn find_cycle(nodes: &[Node]) -> Option<Vec<String>> {
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.name.as_str(), i))
        .collect();
    let edges: Vec<Vec<usize>> = nodes
        .iter()
        .map(|n| {
            n.referenced_nodes()
                .into_iter()
                .filter_map(|name| index.get(name).copied())
                .collect()
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; nodes.len()];

    for start in 0..nodes.len() {
        if marks[start] == Mark::Unvisited {
            if let Some(cycle) = visit(start, &edges, &mut marks) {
                return Some(cycle.into_iter().map(|i| nodes[i].name.clone()).collect());
            }
        }
    }

    None
}

/// Depth-first search from `start` with an explicit stack of
/// (node, next edge) frames, so deep chains cannot overflow the call stack
fn visit(start: usize, edges: &[Vec<usize>], marks: &mut [Mark]) -> Option<Vec<usize>> {
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    marks[start] = Mark::InProgress;

    while let Some(frame) = stack.last_mut() {
        let (current, edge) = *frame;
        let Some(&next) = edges[current].get(edge) else {
            marks[current] = Mark::Done;
            stack.pop();
            continue;
        };
        frame.1 += 1;

        match marks[next] {
            Mark::InProgress => {
                let first = stack.iter().position(|&(i, _)| i == next).unwrap_or(0);
                let mut cycle: Vec<usize> = stack[first..].iter().map(|&(i, _)| i).collect();
                cycle.push(next);
                return Some(cycle);
            }
            Mark::Unvisited => {
                marks[next] = Mark::InProgress;
                stack.push((next, 0));
            }
            Mark::Done => {}
        }
    }

    None
}
