// SPDX-License-Identifier: MIT

//! kinetic-flow: a DAG flow scheduler and executor
//!
//! Flows are YAML files declaring nodes that run tools. Node inputs reference
//! flow inputs and other nodes' outputs; `skip` and `activate` conditions let
//! nodes be bypassed. See [`kinetic::workflow::graph::DagManager`] for the
//! scheduling rules.

pub mod adk;
pub mod kinetic;
