// SPDX-License-Identifier: MIT

//! Executor configuration
//!
//! Values come from the environment (a `.env` file is honoured by the
//! binary) and can be overridden on the command line.

use std::env;
use std::time::Duration;

use crate::adk::error::KineticError;

pub const MAX_CONCURRENCY_VAR: &str = "KINETIC_MAX_CONCURRENCY";
pub const NODE_TIMEOUT_VAR: &str = "KINETIC_NODE_TIMEOUT_SECS";

const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Settings for a flow run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Maximum number of nodes executing at the same time
    pub max_concurrency: usize,
    /// Per-node execution limit; `None` disables it
    pub node_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            node_timeout: None,
        }
    }
}

impl ExecutorConfig {
    /// Read `KINETIC_MAX_CONCURRENCY` and `KINETIC_NODE_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, KineticError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, KineticError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_CONCURRENCY_VAR) {
            config.max_concurrency = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(KineticError::config(format!(
                        "{} must be a positive integer, got '{}'",
                        MAX_CONCURRENCY_VAR, raw
                    )))
                }
            };
        }

        if let Some(raw) = lookup(NODE_TIMEOUT_VAR) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                KineticError::config(format!(
                    "{} must be a number of seconds, got '{}'",
                    NODE_TIMEOUT_VAR, raw
                ))
            })?;
            config.node_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}
