// SPDX-License-Identifier: MIT

pub mod config;
pub mod tools;
pub mod workflow;
