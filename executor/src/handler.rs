// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! `Handler`, a tagged variant over the six contract-handler families a
//! `CallContext` ever pushes onto its frame stack. `Transfer`, `Deploy`,
//! `Accept` and `Patch` run inline (`execute_sync`); `Call` and `GetApi`
//! are dispatched to an external executor and their result arrives later
//! through the `CallContext`'s mailbox.

use crate::lock::{LockMode, LockRequest};
use crate::world_state::WorldState;
use bc_config::{StepConfig, StepType};
use bc_crypto::{Address, HashValue};
use bc_failure_ext::Result;
use bc_types::account::ContractInfo;
use bc_types::status::StatusCode;
use bc_types::validator::ValidatorList;
use primitive_types::U256;
use std::convert::TryInto;

#[derive(Clone, Debug)]
pub enum Handler {
    Transfer { from: Address, to: Address, value: U256 },
    Deploy { from: Address, code: Vec<u8>, timestamp: i64, nonce: u64 },
    Accept { contract_address: Address, deploy_tx_hash: HashValue },
    Call { from: Address, to: Address, method: String, params: Vec<u8> },
    GetApi { to: Address },
    Patch { next_validators: Option<ValidatorList> },
}

/// The outcome of running a handler to completion, in the same shape a
/// `Receipt` is built from.
pub struct HandlerOutcome {
    pub status: StatusCode,
    pub step_used: u64,
    pub value: Vec<u8>,
    pub score_address: Option<Address>,
}

impl HandlerOutcome {
    fn success(step_used: u64) -> Self {
        Self { status: StatusCode::SUCCESS, step_used, value: Vec::new(), score_address: None }
    }

    fn failure(status: StatusCode, step_used: u64) -> Self {
        Self { status, step_used, value: Vec::new(), score_address: None }
    }
}

impl Handler {
    pub fn is_async(&self) -> bool {
        matches!(self, Handler::Call { .. } | Handler::GetApi { .. })
    }

    pub fn lock_requests(&self) -> Vec<LockRequest> {
        match self {
            Handler::Transfer { from, to, .. } => vec![
                LockRequest { account: *from, mode: LockMode::Write },
                LockRequest { account: *to, mode: LockMode::Write },
            ],
            Handler::Deploy { from, .. } => vec![LockRequest { account: *from, mode: LockMode::Write }],
            Handler::Accept { contract_address, .. } => {
                vec![LockRequest { account: *contract_address, mode: LockMode::Write }]
            }
            Handler::Call { from, to, .. } => vec![
                LockRequest { account: *from, mode: LockMode::Write },
                LockRequest { account: *to, mode: LockMode::Write },
            ],
            Handler::GetApi { to } => vec![LockRequest { account: *to, mode: LockMode::Read }],
            Handler::Patch { .. } => Vec::new(),
        }
    }

    /// Computes `contract_address = last 20 bytes of
    /// SHA3-256(from ‖ pad32(timestamp) ‖ pad32(nonce))`, the address a
    /// `Deploy` handler assigns its new contract.
    pub fn deploy_contract_address(from: &Address, timestamp: i64, nonce: u64) -> Address {
        let mut preimage = Vec::with_capacity(20 + 32 + 32);
        preimage.extend_from_slice(from.as_bytes());
        preimage.extend_from_slice(&pad32(&(timestamp as u64).to_be_bytes()));
        preimage.extend_from_slice(&pad32(&nonce.to_be_bytes()));
        let hash = HashValue::sha3_256_of(&preimage);
        Address::new(hash.as_bytes()[bc_crypto::hash::HASH_LENGTH - 20..].try_into().expect("20-byte slice"))
    }

    /// Runs the handler inline against `world`. Must not be called for
    /// `Call`/`GetApi`, which only ever run through `CallContext`'s async
    /// dispatch path.
    pub fn execute_sync(&self, world: &mut WorldState, costs: &StepConfig) -> Result<HandlerOutcome> {
        match self {
            Handler::Transfer { from, to, value } => {
                let mut sender = world.get_account(from)?;
                if sender.balance < *value {
                    return Ok(HandlerOutcome::failure(StatusCode::OUT_OF_BALANCE, costs.cost_for(StepType::Default)));
                }
                sender.balance -= *value;
                world.set_account(from, &sender)?;

                let mut recipient = world.get_account(to)?;
                recipient.balance += *value;
                world.set_account(to, &recipient)?;

                Ok(HandlerOutcome::success(costs.cost_for(StepType::Default)))
            }
            Handler::Deploy { from, code, timestamp, nonce } => {
                let step_used = costs.deploy_cost(code.len());
                let contract_address = Self::deploy_contract_address(from, *timestamp, *nonce);
                let mut account = world.get_account(&contract_address)?;
                account.next_contract = Some(ContractInfo {
                    code: code.clone(),
                    api_info: Vec::new(),
                    storage_root: HashValue::zero(),
                    owner: *from,
                });
                world.set_account(&contract_address, &account)?;
                Ok(HandlerOutcome {
                    status: StatusCode::SUCCESS,
                    step_used,
                    value: Vec::new(),
                    score_address: Some(contract_address),
                })
            }
            Handler::Accept { contract_address, .. } => {
                let mut account = world.get_account(contract_address)?;
                let pending = match account.next_contract.take() {
                    Some(pending) => pending,
                    None => return Ok(HandlerOutcome::failure(StatusCode::SYSTEM_ERROR, 0)),
                };
                let step_type =
                    if account.current_contract.is_some() { StepType::ContractUpdate } else { StepType::ContractCreate };
                account.current_contract = Some(pending);
                world.set_account(contract_address, &account)?;
                Ok(HandlerOutcome {
                    status: StatusCode::SUCCESS,
                    step_used: costs.cost_for(step_type),
                    value: Vec::new(),
                    score_address: Some(*contract_address),
                })
            }
            Handler::Patch { .. } => Ok(HandlerOutcome::success(0)),
            Handler::Call { .. } | Handler::GetApi { .. } => {
                Err(bc_failure_ext::format_err!("{:?} must run through CallContext's async dispatch, not execute_sync", self))
            }
        }
    }

    /// The external-executor environment type this async handler runs
    /// under, e.g. `"python"`. `None` for handlers that never dispatch.
    pub fn ee_type(&self) -> Option<&'static str> {
        match self {
            Handler::Call { .. } | Handler::GetApi { .. } => Some("python"),
            _ => None,
        }
    }
}

fn pad32(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;
    use bc_trie::MemNodeStore;
    use std::sync::Arc;

    fn world() -> WorldState {
        WorldState::new(Arc::new(MemNodeStore::new()))
    }

    #[test]
    fn transfer_moves_balance_between_accounts() {
        let mut state = world();
        let from = deterministic_private_key(1).address();
        let to = deterministic_private_key(2).address();
        state
            .set_account(&from, &bc_types::account::AccountSnapshot { balance: U256::from(100u64), ..Default::default() })
            .unwrap();

        let outcome = Handler::Transfer { from, to, value: U256::from(40u64) }.execute_sync(&mut state, &StepConfig::default()).unwrap();
        assert_eq!(outcome.status, StatusCode::SUCCESS);
        assert_eq!(state.get_account(&from).unwrap().balance, U256::from(60u64));
        assert_eq!(state.get_account(&to).unwrap().balance, U256::from(40u64));
    }

    #[test]
    fn transfer_beyond_balance_fails_without_mutating_state() {
        let mut state = world();
        let from = deterministic_private_key(1).address();
        let to = deterministic_private_key(2).address();

        let outcome = Handler::Transfer { from, to, value: U256::from(1u64) }.execute_sync(&mut state, &StepConfig::default()).unwrap();
        assert_eq!(outcome.status, StatusCode::OUT_OF_BALANCE);
        assert_eq!(state.get_account(&from).unwrap().balance, U256::zero());
    }

    #[test]
    fn deploy_then_accept_promotes_the_pending_contract() {
        let mut state = world();
        let from = deterministic_private_key(1).address();
        let deploy = Handler::Deploy { from, code: vec![1, 2, 3], timestamp: 10, nonce: 0 };
        let outcome = deploy.execute_sync(&mut state, &StepConfig::default()).unwrap();
        let contract_address = outcome.score_address.unwrap();
        assert!(state.get_account(&contract_address).unwrap().next_contract.is_some());

        let accept = Handler::Accept { contract_address, deploy_tx_hash: HashValue::zero() };
        accept.execute_sync(&mut state, &StepConfig::default()).unwrap();
        let account = state.get_account(&contract_address).unwrap();
        assert!(account.current_contract.is_some());
        assert!(account.next_contract.is_none());
    }

    #[test]
    fn deploy_cost_scales_with_code_length() {
        let from = deterministic_private_key(1).address();
        let costs = StepConfig::default();
        let small = Handler::Deploy { from, code: vec![0; 10], timestamp: 0, nonce: 0 };
        let large = Handler::Deploy { from, code: vec![0; 1000], timestamp: 0, nonce: 0 };
        assert!(small.execute_sync(&mut world(), &costs).unwrap().step_used < large.execute_sync(&mut world(), &costs).unwrap().step_used);
    }

    #[test]
    fn call_and_get_api_are_async() {
        let from = deterministic_private_key(1).address();
        assert!(Handler::Call { from, to: from, method: "x".to_string(), params: vec![] }.is_async());
        assert!(Handler::GetApi { to: from }.is_async());
        assert!(!Handler::Transfer { from, to: from, value: U256::zero() }.is_async());
    }
}
