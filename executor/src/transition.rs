// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! `Transition`: binds a patch/normal transaction list and a parent world
//! state, and runs validate -> execute on a worker thread, producing a new
//! result hash, receipts and (possibly) an updated validator set. Two
//! transitions over the same input always produce bit-identical output;
//! `execute` is callable at most once.

use crate::call_context::{CallContext, Dispatcher};
use crate::handler::Handler;
use crate::lock::LockTable;
use crate::world_state::WorldState;
use bc_config::StepConfig;
use bc_crypto::{Address, HashValue};
use bc_logger::prelude::{debug, warn};
use bc_trie::NodeStore;
use bc_types::block::LOG_BLOOM_LENGTH;
use bc_types::error::BlockManagerError;
use bc_types::receipt::{Receipt, ReceiptList};
use bc_types::transaction::{Transaction, TransactionData, TransactionList};
use bc_types::validator::ValidatorList;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct TransitionOutput {
    pub next_result: Vec<u8>,
    /// The raw world-state root the flushed trie now lives under, as
    /// opposed to `next_result`'s opaque hash of it -- a block manager
    /// needs this to reopen `WorldState::from_root_hash` for the next
    /// transition.
    pub state_root: HashValue,
    pub next_validators: ValidatorList,
    pub log_bloom: [u8; LOG_BLOOM_LENGTH],
    pub patch_receipts: ReceiptList,
    pub normal_receipts: ReceiptList,
}

pub trait TransitionCallback: Send + Sync {
    fn on_validate(&self, result: std::result::Result<(), BlockManagerError>);
    fn on_execute(&self, result: std::result::Result<TransitionOutput, BlockManagerError>);
}

/// Returns `true` iff the user callback had not yet fired and now never
/// will.
pub type Canceler = Arc<dyn Fn() -> bool + Send + Sync>;

pub struct Transition {
    parent_validators: ValidatorList,
    parent_state_root: HashValue,
    patch_txs: TransactionList,
    normal_txs: TransactionList,
    store: Arc<dyn NodeStore>,
    step_config: StepConfig,
    transaction_time_limit: Duration,
    dispatcher: Arc<dyn Dispatcher>,
    blacklist: Arc<HashSet<Address>>,
    executed: AtomicBool,
    cancelled: Arc<AtomicBool>,
}

impl Transition {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parent_validators: ValidatorList,
        parent_state_root: HashValue,
        patch_txs: TransactionList,
        normal_txs: TransactionList,
        store: Arc<dyn NodeStore>,
        step_config: StepConfig,
        transaction_time_limit: Duration,
        dispatcher: Arc<dyn Dispatcher>,
        blacklist: Arc<HashSet<Address>>,
    ) -> Self {
        Self {
            parent_validators,
            parent_state_root,
            patch_txs,
            normal_txs,
            store,
            step_config,
            transaction_time_limit,
            dispatcher,
            blacklist,
            executed: AtomicBool::new(false),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs validate then execute on a dedicated worker thread, delivering
    /// `on_validate` and (if validation succeeded) `on_execute` to
    /// `callback`. Returns a canceler immediately; the synchronous `Result`
    /// only ever reports that `execute` was already called once on this
    /// instance.
    pub fn execute(&self, callback: Arc<dyn TransitionCallback>) -> (Canceler, std::result::Result<(), BlockManagerError>) {
        if self.executed.swap(true, Ordering::SeqCst) {
            return (Arc::new(|| false), Err(BlockManagerError::SystemError("execute called more than once".to_string())));
        }

        let cancelled = self.cancelled.clone();
        let canceler: Canceler = Arc::new(move || !cancelled.swap(true, Ordering::SeqCst));

        let patch_txs = self.patch_txs.clone();
        let normal_txs = self.normal_txs.clone();
        let parent_validators = self.parent_validators.clone();
        let parent_state_root = self.parent_state_root;
        let store = self.store.clone();
        let step_config = self.step_config.clone();
        let transaction_time_limit = self.transaction_time_limit;
        let dispatcher = self.dispatcher.clone();
        let blacklist = self.blacklist.clone();
        let cancel_flag = self.cancelled.clone();

        std::thread::spawn(move || {
            if let Err(err) = validate(&patch_txs, &normal_txs, &blacklist) {
                warn!("transition validation failed"; "error" => %err);
                callback.on_validate(Err(err));
                return;
            }
            callback.on_validate(Ok(()));
            if cancel_flag.load(Ordering::SeqCst) {
                debug!("transition cancelled before execution started");
                return;
            }

            let outcome = execute(
                &parent_validators,
                parent_state_root,
                &patch_txs,
                &normal_txs,
                store,
                &step_config,
                transaction_time_limit,
                &*dispatcher,
                &cancel_flag,
            );
            if !cancel_flag.load(Ordering::SeqCst) {
                callback.on_execute(outcome);
            } else {
                debug!("transition cancelled, suppressing callback");
            }
        });

        (canceler, Ok(()))
    }
}

/// Signature, version, step limit, blacklist and intra-block duplication
/// checks, in order. Any failure aborts validation at that transaction
/// without looking further.
fn validate(
    patch_txs: &TransactionList,
    normal_txs: &TransactionList,
    blacklist: &HashSet<Address>,
) -> std::result::Result<(), BlockManagerError> {
    let mut seen = HashSet::new();
    for tx in patch_txs.iter().chain(normal_txs.iter()) {
        if !tx.verify_signature() {
            return Err(BlockManagerError::InvalidTransaction("signature does not recover to the declared sender".to_string()));
        }
        if tx.raw.version == 0 {
            return Err(BlockManagerError::InvalidTransaction("unversioned transaction".to_string()));
        }
        if tx.raw.step_limit == 0 {
            return Err(BlockManagerError::InvalidTransaction("zero step limit".to_string()));
        }
        if blacklist.contains(&tx.raw.from) {
            return Err(BlockManagerError::InvalidTransaction("sender is blacklisted".to_string()));
        }
        if !seen.insert(tx.id()) {
            return Err(BlockManagerError::InvalidTransaction("duplicate transaction within block".to_string()));
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn execute(
    parent_validators: &ValidatorList,
    parent_state_root: HashValue,
    patch_txs: &TransactionList,
    normal_txs: &TransactionList,
    store: Arc<dyn NodeStore>,
    step_config: &StepConfig,
    transaction_time_limit: Duration,
    dispatcher: &dyn Dispatcher,
    cancelled: &AtomicBool,
) -> std::result::Result<TransitionOutput, BlockManagerError> {
    let mut world = WorldState::from_root_hash(parent_state_root, store);
    let locks = LockTable::new();
    let mut next_validators = parent_validators.clone();
    let log_bloom = Mutex::new([0u8; LOG_BLOOM_LENGTH]);

    let patch_receipts = ReceiptList::new(run_transactions(
        patch_txs,
        &mut world,
        &locks,
        step_config,
        transaction_time_limit,
        dispatcher,
        &mut next_validators,
        &log_bloom,
        cancelled,
    )?);
    let normal_receipts = ReceiptList::new(run_transactions(
        normal_txs,
        &mut world,
        &locks,
        step_config,
        transaction_time_limit,
        dispatcher,
        &mut next_validators,
        &log_bloom,
        cancelled,
    )?);

    let state_root = world.flush().map_err(|e| BlockManagerError::StoreIO(e.to_string()))?;
    let next_result = HashValue::sha3_256_of(
        &[state_root.as_bytes().as_slice(), patch_receipts.hash().as_bytes().as_slice(), normal_receipts.hash().as_bytes().as_slice()]
            .concat(),
    )
    .as_bytes()
    .to_vec();

    Ok(TransitionOutput {
        next_result,
        state_root,
        next_validators,
        log_bloom: *log_bloom.lock().expect("log bloom mutex poisoned"),
        patch_receipts,
        normal_receipts,
    })
}

#[allow(clippy::too_many_arguments)]
fn run_transactions(
    txs: &TransactionList,
    world: &mut WorldState,
    locks: &LockTable,
    step_config: &StepConfig,
    transaction_time_limit: Duration,
    dispatcher: &dyn Dispatcher,
    next_validators: &mut ValidatorList,
    log_bloom: &Mutex<[u8; LOG_BLOOM_LENGTH]>,
    cancelled: &AtomicBool,
) -> std::result::Result<Vec<Receipt>, BlockManagerError> {
    let mut receipts = Vec::with_capacity(txs.len());
    for tx in txs.iter() {
        if cancelled.load(Ordering::SeqCst) {
            return Err(BlockManagerError::Cancelled);
        }
        let receipt = execute_one(tx, world, locks, step_config, transaction_time_limit, dispatcher, next_validators);
        fold_log_bloom(log_bloom, &receipt);
        receipts.push(receipt);
    }
    Ok(receipts)
}

fn execute_one(
    tx: &Transaction,
    world: &mut WorldState,
    locks: &LockTable,
    step_config: &StepConfig,
    transaction_time_limit: Duration,
    dispatcher: &dyn Dispatcher,
    next_validators: &mut ValidatorList,
) -> Receipt {
    if let TransactionData::Accept { deploy_tx_hash } = &tx.raw.data {
        let contract_address = tx.raw.to.unwrap_or(tx.raw.from);
        let (status, step_used, logs, score_address) = run_accept(
            world,
            locks,
            step_config,
            transaction_time_limit,
            tx.raw.step_limit,
            dispatcher,
            tx.raw.from,
            contract_address,
            *deploy_tx_hash,
        );
        return Receipt { status, step_used, score_address, logs };
    }

    let handler = handler_for(tx);
    let _guard = locks.acquire(&handler.lock_requests());

    let ctx = CallContext::new(transaction_time_limit, tx.raw.step_limit, handler.clone());
    let (status, mut step_used, logs, mut score_address) = match ctx.run(world, step_config, dispatcher) {
        Ok(outcome) => outcome,
        Err(_) => (bc_types::status::StatusCode::SYSTEM_ERROR, 0, Vec::new(), None),
    };

    if status.is_success() {
        if let Handler::Deploy { .. } = &handler {
            if let Some(contract_address) = score_address {
                drop(_guard);
                let (accept_status, accept_step, _, accept_addr) = run_accept(
                    world,
                    locks,
                    step_config,
                    transaction_time_limit,
                    tx.raw.step_limit,
                    dispatcher,
                    tx.raw.from,
                    contract_address,
                    tx.id(),
                );
                step_used += accept_step;
                score_address = accept_addr.or(score_address);
                return Receipt { status: accept_status, step_used, score_address, logs };
            }
        }
        if let TransactionData::Patch { next_validators: patch_validators } = &tx.raw.data {
            if let Some(updated) = patch_validators {
                *next_validators = updated.clone();
            }
        }
    }

    Receipt { status, step_used, score_address, logs }
}

/// Runs a contract's install/update gate: `GetApi` to fetch its API info,
/// then the matching `on_install`/`on_update` call, and only once both
/// succeed, promotes the staged `next_contract` to `current_contract` via
/// `Handler::Accept`. Mirrors the three-step gate of the original
/// deploy-handler: a pending contract is never live until both calls
/// report success.
#[allow(clippy::too_many_arguments)]
fn run_accept(
    world: &mut WorldState,
    locks: &LockTable,
    step_config: &StepConfig,
    transaction_time_limit: Duration,
    step_limit: u64,
    dispatcher: &dyn Dispatcher,
    from: Address,
    contract_address: Address,
    deploy_tx_hash: HashValue,
) -> (bc_types::status::StatusCode, u64, Vec<u8>, Option<Address>) {
    let get_api = Handler::GetApi { to: contract_address };
    let guard = locks.acquire(&get_api.lock_requests());
    let ctx = CallContext::new(transaction_time_limit, step_limit, get_api);
    let (status, mut step_used, api_info, _) = match ctx.run(world, step_config, dispatcher) {
        Ok(outcome) => outcome,
        Err(_) => (bc_types::status::StatusCode::SYSTEM_ERROR, 0, Vec::new(), None),
    };
    drop(guard);
    if !status.is_success() {
        return (status, step_used, Vec::new(), None);
    }

    let method = if let Ok(mut account) = world.get_account(&contract_address) {
        let method = if account.current_contract.is_some() { "on_update" } else { "on_install" };
        if let Some(pending) = account.next_contract.as_mut() {
            pending.api_info = api_info;
        }
        let _ = world.set_account(&contract_address, &account);
        method
    } else {
        "on_install"
    };

    let install = Handler::Call { from, to: contract_address, method: method.to_string(), params: Vec::new() };
    let guard = locks.acquire(&install.lock_requests());
    let ctx = CallContext::new(transaction_time_limit, step_limit, install);
    let (install_status, install_step, ..) = match ctx.run(world, step_config, dispatcher) {
        Ok(outcome) => outcome,
        Err(_) => (bc_types::status::StatusCode::SYSTEM_ERROR, 0, Vec::new(), None),
    };
    drop(guard);
    step_used += install_step;
    if !install_status.is_success() {
        return (install_status, step_used, Vec::new(), None);
    }

    let accept = Handler::Accept { contract_address, deploy_tx_hash };
    let guard = locks.acquire(&accept.lock_requests());
    let result = match accept.execute_sync(world, step_config) {
        Ok(outcome) => (outcome.status, step_used + outcome.step_used, outcome.value, outcome.score_address),
        Err(_) => (bc_types::status::StatusCode::SYSTEM_ERROR, step_used, Vec::new(), None),
    };
    drop(guard);
    result
}

fn handler_for(tx: &Transaction) -> Handler {
    let from = tx.raw.from;
    match &tx.raw.data {
        TransactionData::Transfer => Handler::Transfer { from, to: tx.raw.to.unwrap_or(from), value: tx.raw.value },
        TransactionData::Deploy { code } => {
            Handler::Deploy { from, code: code.clone(), timestamp: 0, nonce: tx.raw.nonce }
        }
        TransactionData::Call { method, params } => {
            Handler::Call { from, to: tx.raw.to.unwrap_or(from), method: method.clone(), params: params.clone() }
        }
        TransactionData::Accept { deploy_tx_hash } => {
            Handler::Accept { contract_address: tx.raw.to.unwrap_or(from), deploy_tx_hash: *deploy_tx_hash }
        }
        TransactionData::Patch { next_validators } => Handler::Patch { next_validators: next_validators.clone() },
    }
}

fn fold_log_bloom(log_bloom: &Mutex<[u8; LOG_BLOOM_LENGTH]>, receipt: &Receipt) {
    if receipt.logs.is_empty() {
        return;
    }
    let digest = HashValue::sha3_256_of(&receipt.logs);
    let mut bloom = log_bloom.lock().expect("log bloom mutex poisoned");
    for (i, byte) in digest.as_bytes().iter().enumerate() {
        bloom[i % LOG_BLOOM_LENGTH] |= byte;
    }
}
