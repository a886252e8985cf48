// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Which side of the pairing this process runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Hub: mirrors source secrets between paired clusters
    Hub,
    /// Member cluster agent: publishes object storage credentials to the hub
    Agent {
        spoke_cluster_name: String,
        hub_kubeconfig: String,
    },
}

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub role: Role,
    /// Delay before retrying when a referenced object does not exist yet
    pub not_found_requeue: Duration,
    pub error_requeue: Duration,
    /// Upper bound for the work done for a single pairing member
    pub member_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            role: Role::Hub,
            not_found_requeue: Duration::from_secs(10),
            error_requeue: Duration::from_secs(60),
            member_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let role = match env::var("OPERATOR_ROLE")
            .unwrap_or_else(|_| "hub".to_string())
            .as_str()
        {
            "hub" => Role::Hub,
            "agent" => Role::Agent {
                spoke_cluster_name: env::var("SPOKE_CLUSTER_NAME")
                    .context("SPOKE_CLUSTER_NAME environment variable not set")?,
                hub_kubeconfig: env::var("HUB_KUBECONFIG")
                    .context("HUB_KUBECONFIG environment variable not set")?,
            },
            other => bail!("OPERATOR_ROLE must be 'hub' or 'agent', got '{}'", other),
        };

        let defaults = Config::default();
        Ok(Config {
            role,
            not_found_requeue: secs_from_env("NOT_FOUND_REQUEUE_SECS", defaults.not_found_requeue)?,
            error_requeue: secs_from_env("ERROR_REQUEUE_SECS", defaults.error_requeue)?,
            member_timeout: secs_from_env("MEMBER_TIMEOUT_SECS", defaults.member_timeout)?,
        })
    }
}

fn secs_from_env(var: &str, default: Duration) -> Result<Duration> {
    match env::var(var) {
        Ok(v) => {
            let secs: u64 = v
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", var, v))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}
