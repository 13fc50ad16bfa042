// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::config::{GenesisConfig, MempoolConfig, StepConfig};
use bc_failure_ext::{format_err, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    pub transaction_time_limit_ms: u64,
    pub mempool: MempoolConfig,
    pub step: StepConfig,
    pub genesis: GenesisConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            transaction_time_limit_ms: 5_000,
            mempool: MempoolConfig::default(),
            step: StepConfig::default(),
            genesis: GenesisConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| format_err!("malformed node config: {}", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|_| format!("reading node config at {:?}", path.as_ref()))?;
        Self::parse(&contents)
    }

    pub fn transaction_time_limit(&self) -> Duration {
        Duration::from_millis(self.transaction_time_limit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transaction_time_limit_is_five_seconds() {
        assert_eq!(NodeConfig::default().transaction_time_limit(), Duration::from_secs(5));
    }

    #[test]
    fn parses_a_partial_toml_document_over_defaults() {
        let config = NodeConfig::parse(
            r#"
            transaction_time_limit_ms = 10000

            [mempool]
            capacity = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.transaction_time_limit_ms, 10_000);
        assert_eq!(config.mempool.capacity, 42);
        // Fields not present in the document keep their defaults.
        assert_eq!(config.mempool.block_tx_limit, MempoolConfig::default().block_tx_limit);
        assert_eq!(config.step, StepConfig::default());
    }

    #[test]
    fn loading_a_missing_file_fails() {
        assert!(NodeConfig::load("/nonexistent/path/node.toml").is_err());
    }
}
