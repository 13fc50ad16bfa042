// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum StepType {
    Default,
    ContractCall,
    ContractCreate,
    ContractUpdate,
    ContractDestruct,
    StorageSet,
    StorageReplace,
    StorageDelete,
    EventLog,
    ApiCall,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct StepConfig {
    // Deploy's per-byte cost: step_used = len(code_bytes) * step_per_byte.
    pub step_per_byte: u64,
    pub default: u64,
    pub contract_call: u64,
    pub contract_create: u64,
    pub contract_update: u64,
    pub contract_destruct: u64,
    pub storage_set: u64,
    pub storage_replace: u64,
    pub storage_delete: u64,
    pub event_log: u64,
    pub api_call: u64,
}

impl StepConfig {
    pub fn cost_for(&self, step: StepType) -> u64 {
        match step {
            StepType::Default => self.default,
            StepType::ContractCall => self.contract_call,
            StepType::ContractCreate => self.contract_create,
            StepType::ContractUpdate => self.contract_update,
            StepType::ContractDestruct => self.contract_destruct,
            StepType::StorageSet => self.storage_set,
            StepType::StorageReplace => self.storage_replace,
            StepType::StorageDelete => self.storage_delete,
            StepType::EventLog => self.event_log,
            StepType::ApiCall => self.api_call,
        }
    }

    pub fn deploy_cost(&self, code_len: usize) -> u64 {
        code_len as u64 * self.step_per_byte
    }
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            step_per_byte: 1,
            default: 1,
            contract_call: 1_000,
            contract_create: 2_000_000,
            contract_update: 1_600_000,
            contract_destruct: 1_600_000,
            storage_set: 320,
            storage_replace: 80,
            storage_delete: 0,
            event_log: 100,
            api_call: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_cost_scales_with_code_length() {
        let config = StepConfig::default();
        assert_eq!(config.deploy_cost(100), 100 * config.step_per_byte);
    }
}
