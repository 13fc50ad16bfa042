// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

mod genesis_config;
mod mempool_config;
mod node_config;
mod step_config;

pub use genesis_config::GenesisConfig;
pub use mempool_config::MempoolConfig;
pub use node_config::NodeConfig;
pub use step_config::{StepConfig, StepType};
