// SPDX-License-Identifier: MIT

//! Graph-based flow execution
//!
//! This module provides the DAG manager that tracks node resolution, the
//! structural validator and the executor that drives a run.

pub mod dag_manager;
pub mod executor;
pub mod types;
mod validate;

pub use dag_manager::DagManager;
pub use executor::FlowExecutor;
pub use types::{ActivateCondition, Node, NodeState, SkipCondition};
pub use validate::{find_cycle, validate_nodes};
