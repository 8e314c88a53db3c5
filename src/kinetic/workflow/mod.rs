// SPDX-License-Identifier: MIT

pub mod builder;
pub mod flow;
pub mod graph;
pub mod loader;
pub mod reference;
pub mod registry;
pub mod run_info;
pub mod types;
