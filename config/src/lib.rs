// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Loads and validates the on-disk configuration for a blockcore node.

pub mod config;

pub use config::{GenesisConfig, MempoolConfig, NodeConfig, StepConfig, StepType};
