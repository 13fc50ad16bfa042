// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! `BlockManager`: the canonical chain keeper. It resolves parents, drives
//! the executor's `Transition` pipeline against a proposed or imported
//! block's transactions, and persists the result durably once `Finalize`
//! is called. A block a `Propose`/`Import` callback receives is never
//! implicitly committed -- the caller decides whether and when to
//! `Finalize` it.

use crate::wallet::Wallet;
use bc_crypto::{Address, HashValue};
use bc_executor::{Canceler, Dispatcher, Service, Transition, TransitionCallback, TransitionOutput};
use bc_schemadb::{keys, Db};
use bc_trie::NodeStore;
use bc_types::block::Block;
use bc_types::error::BlockManagerError;
use bc_types::receipt::ReceiptList;
use bc_types::transaction::TransactionList;
use bc_types::validator::ValidatorList;
use bc_types::vote::VoteSet;
use bc_logger::prelude::{debug, error};
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Receives the outcome of a `propose`/`import` call: either the fully
/// assembled block, or the `BlockManagerError` that aborted it. Delivered
/// exactly once, unless the returned canceler won the race and aborted
/// delivery first.
pub trait BlockCallback: Send + Sync {
    fn on_result(&self, result: Result<Block, BlockManagerError>);
}

/// What a successful `Propose`/`Import` caches against a block's id so a
/// later `Finalize` doesn't need to re-run the transition to learn the
/// receipts and state root it produced.
struct Assembled {
    state_root: HashValue,
    patch_receipts: ReceiptList,
    normal_receipts: ReceiptList,
}

#[allow(clippy::too_many_arguments)]
pub struct BlockManager {
    db: Arc<dyn Db>,
    store: Arc<dyn NodeStore>,
    mempool: Arc<bc_mempool::Mempool>,
    wallet: Arc<dyn Wallet>,
    patch_service: Arc<dyn Service>,
    step_config: bc_config::StepConfig,
    transaction_time_limit: Duration,
    dispatcher: Arc<dyn Dispatcher>,
    blacklist: Arc<HashSet<Address>>,
    assembled: Arc<Mutex<HashMap<HashValue, Assembled>>>,
}

impl BlockManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<dyn Db>,
        store: Arc<dyn NodeStore>,
        mempool: Arc<bc_mempool::Mempool>,
        wallet: Arc<dyn Wallet>,
        patch_service: Arc<dyn Service>,
        step_config: bc_config::StepConfig,
        transaction_time_limit: Duration,
        dispatcher: Arc<dyn Dispatcher>,
        blacklist: Arc<HashSet<Address>>,
    ) -> Self {
        Self {
            db,
            store,
            mempool,
            wallet,
            patch_service,
            step_config,
            transaction_time_limit,
            dispatcher,
            blacklist,
            assembled: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Seeds an empty store with the genesis block. A no-op check: fails
    /// if a last block already exists. `state_root` is the root of
    /// whatever accounts the caller pre-funds the genesis world state
    /// with (an empty trie's root if none).
    pub fn init_genesis(
        &self,
        validators: ValidatorList,
        result: Vec<u8>,
        state_root: HashValue,
        timestamp: i64,
    ) -> Result<(), BlockManagerError> {
        if self.get_last_block()?.is_some() {
            return Err(BlockManagerError::SystemError("genesis already initialized".to_string()));
        }
        let block = Block::genesis(validators, result, timestamp);
        let id = block.id();
        self.store_io(self.db.put(keys::block_header(&id), block.encode_header()))?;
        self.store_io(self.db.put(keys::block_body(&id), block.encode_body()))?;
        self.store_io(self.db.put(keys::state_root(&id), state_root.to_vec()))?;
        self.store_io(self.db.put(keys::block_by_height(0), id.to_vec()))?;
        self.store_io(self.db.put(keys::last_block(), id.to_vec()))?;
        Ok(())
    }

    pub fn get_last_block(&self) -> Result<Option<Block>, BlockManagerError> {
        match self.store_io(self.db.get(&keys::last_block()))? {
            None => Ok(None),
            Some(bytes) => self.read_block(&bytes_to_hash(&bytes)?),
        }
    }

    pub fn get_block(&self, id: &HashValue) -> Result<Option<Block>, BlockManagerError> {
        self.read_block(id)
    }

    pub fn get_block_by_height(&self, height: i64) -> Result<Option<Block>, BlockManagerError> {
        match self.store_io(self.db.get(&keys::block_by_height(height as u64)))? {
            None => Ok(None),
            Some(bytes) => self.read_block(&bytes_to_hash(&bytes)?),
        }
    }

    /// Resolves `parent_id`, validates `commit_votes` against it, drains
    /// the mempool for `normal_txs` and the patch service for `patch_txs`,
    /// then drives a child `Transition`. The returned canceler forwards to
    /// the transition's own; a synchronous error means `parent_id` or
    /// `commit_votes` failed an upfront check and no transition ever
    /// started.
    pub fn propose(
        &self,
        parent_id: HashValue,
        commit_votes: VoteSet,
        cb: Arc<dyn BlockCallback>,
    ) -> Result<Canceler, BlockManagerError> {
        let parent = self.read_block(&parent_id)?.ok_or(BlockManagerError::BadParent)?;
        commit_votes.verify_commits(parent_id, &parent.next_validators)?;

        let parent_state_root = self.read_state_root(&parent_id)?;
        let patch_txs = self.patch_service.get_patches(&parent.result);
        let normal_txs = TransactionList::new(self.mempool.take_block_transactions());

        let transition = Transition::new(
            parent.next_validators.clone(),
            parent_state_root,
            patch_txs.clone(),
            normal_txs.clone(),
            self.store.clone(),
            self.step_config.clone(),
            self.transaction_time_limit,
            self.dispatcher.clone(),
            self.blacklist.clone(),
        );

        let relay = Arc::new(ProposeRelay {
            assembled: self.assembled.clone(),
            wallet: self.wallet.clone(),
            height: parent.height + 1,
            timestamp: now_millis(),
            prev_id: parent_id,
            votes: commit_votes,
            patch_txs,
            normal_txs,
            cb,
        });
        let (canceler, result) = transition.execute(relay);
        result?;
        Ok(canceler)
    }

    /// Decodes a header/body pair, re-verifies everything the proposer
    /// already vouched for (id, signature, vote quorum, declared tx-list
    /// hashes), then re-runs the transition and requires its output match
    /// the block's declared `result`/`next_validators` exactly.
    pub fn import(
        &self,
        header: &[u8],
        body: &[u8],
        cb: Arc<dyn BlockCallback>,
    ) -> Result<Canceler, BlockManagerError> {
        let block = Block::decode(header, body)
            .map_err(|e| BlockManagerError::SystemError(format!("malformed block: {}", e)))?;
        if !block.verify_signature() {
            return Err(BlockManagerError::SystemError(
                "block signature does not recover to its declared proposer".to_string(),
            ));
        }
        let parent = self.read_block(&block.prev_id)?.ok_or(BlockManagerError::BadParent)?;
        if block.height != parent.height + 1 {
            return Err(BlockManagerError::BadParent);
        }
        block.votes.verify_commits(block.prev_id, &parent.next_validators)?;

        let parent_state_root = self.read_state_root(&block.prev_id)?;
        let transition = Transition::new(
            parent.next_validators.clone(),
            parent_state_root,
            block.patch_txs.clone(),
            block.normal_txs.clone(),
            self.store.clone(),
            self.step_config.clone(),
            self.transaction_time_limit,
            self.dispatcher.clone(),
            self.blacklist.clone(),
        );

        let relay = Arc::new(ImportRelay { assembled: self.assembled.clone(), block, cb });
        let (canceler, result) = transition.execute(relay);
        result?;
        Ok(canceler)
    }

    /// Persists a block this manager itself produced or imported. Requires
    /// strict height/parent contiguity with the current tip; a `StoreIO`
    /// failure here is fatal -- the manager's on-disk state may now be
    /// partially written and should not be trusted further.
    pub fn finalize(&self, block: &Block) -> Result<(), BlockManagerError> {
        match self.get_last_block()? {
            Some(last) if block.height == last.height + 1 && block.prev_id == last.id() => {}
            _ => return Err(BlockManagerError::NonContiguous),
        }

        let id = block.id();
        let assembled = self
            .assembled
            .lock()
            .expect("assembled mutex poisoned")
            .remove(&id)
            .ok_or_else(|| BlockManagerError::SystemError("finalize called on a block this manager never assembled".to_string()))?;

        self.store_io(self.db.put(keys::block_header(&id), block.encode_header()))?;
        self.store_io(self.db.put(keys::block_body(&id), block.encode_body()))?;
        self.put_tx_list(&block.patch_txs)?;
        self.put_tx_list(&block.normal_txs)?;
        self.put_receipts(&assembled.patch_receipts)?;
        self.put_receipts(&assembled.normal_receipts)?;
        self.store_io(self.db.put(keys::state_root(&id), assembled.state_root.to_vec()))?;
        self.store_io(self.db.put(keys::block_by_height(block.height as u64), id.to_vec()))?;
        self.store_io(self.db.put(keys::last_block(), id.to_vec()))?;

        for tx in block.normal_txs.iter() {
            self.mempool.remove(&tx.id());
        }
        debug!("finalized block"; "height" => block.height, "id" => %id);
        Ok(())
    }

    fn read_block(&self, id: &HashValue) -> Result<Option<Block>, BlockManagerError> {
        let header = match self.store_io(self.db.get(&keys::block_header(id)))? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let body = self
            .store_io(self.db.get(&keys::block_body(id)))?
            .ok_or_else(|| BlockManagerError::StoreIO("block header present without a matching body".to_string()))?;
        let block = Block::decode(&header, &body).map_err(|e| BlockManagerError::StoreIO(format!("corrupt stored block: {}", e)))?;
        Ok(Some(block))
    }

    fn read_state_root(&self, id: &HashValue) -> Result<HashValue, BlockManagerError> {
        let bytes = self
            .store_io(self.db.get(&keys::state_root(id)))?
            .ok_or_else(|| BlockManagerError::StoreIO("missing state root for block".to_string()))?;
        bytes_to_hash(&bytes)
    }

    fn put_tx_list(&self, list: &TransactionList) -> Result<(), BlockManagerError> {
        let encoded = bc_lcs::to_bytes(list).map_err(|e| BlockManagerError::StoreIO(e.to_string()))?;
        self.store_io(self.db.put(keys::tx_list(&list.hash()), encoded))
    }

    fn put_receipts(&self, list: &ReceiptList) -> Result<(), BlockManagerError> {
        let encoded = bc_lcs::to_bytes(list).map_err(|e| BlockManagerError::StoreIO(e.to_string()))?;
        self.store_io(self.db.put(keys::receipts(&list.hash()), encoded))
    }

    fn store_io<T>(&self, result: bc_failure_ext::Result<T>) -> Result<T, BlockManagerError> {
        result.map_err(|e| {
            error!("store io failed"; "error" => %e);
            BlockManagerError::StoreIO(e.to_string())
        })
    }
}

fn bytes_to_hash(bytes: &[u8]) -> Result<HashValue, BlockManagerError> {
    HashValue::try_from(bytes).map_err(|e| BlockManagerError::StoreIO(format!("malformed hash in store: {}", e)))
}

fn now_millis() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before the epoch").as_millis() as i64
}

struct ProposeRelay {
    assembled: Arc<Mutex<HashMap<HashValue, Assembled>>>,
    wallet: Arc<dyn Wallet>,
    height: i64,
    timestamp: i64,
    prev_id: HashValue,
    votes: VoteSet,
    patch_txs: TransactionList,
    normal_txs: TransactionList,
    cb: Arc<dyn BlockCallback>,
}

impl TransitionCallback for ProposeRelay {
    fn on_validate(&self, result: Result<(), BlockManagerError>) {
        if let Err(err) = result {
            self.cb.on_result(Err(err));
        }
    }

    fn on_execute(&self, result: Result<TransitionOutput, BlockManagerError>) {
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                self.cb.on_result(Err(err));
                return;
            }
        };

        let mut block = Block {
            version: 1,
            height: self.height,
            timestamp: self.timestamp,
            proposer: self.wallet.address(),
            prev_id: self.prev_id,
            votes: self.votes.clone(),
            patch_txs: self.patch_txs.clone(),
            normal_txs: self.normal_txs.clone(),
            next_validators: output.next_validators,
            result: output.next_result,
            log_bloom: output.log_bloom,
            signature: bc_crypto::Signature::zero(),
        };
        let signature = match self.wallet.sign(&block.id()) {
            Ok(signature) => signature,
            Err(err) => {
                self.cb.on_result(Err(BlockManagerError::SystemError(err.to_string())));
                return;
            }
        };
        block.signature = signature;

        self.assembled.lock().expect("assembled mutex poisoned").insert(
            block.id(),
            Assembled { state_root: output.state_root, patch_receipts: output.patch_receipts, normal_receipts: output.normal_receipts },
        );
        self.cb.on_result(Ok(block));
    }
}

struct ImportRelay {
    assembled: Arc<Mutex<HashMap<HashValue, Assembled>>>,
    block: Block,
    cb: Arc<dyn BlockCallback>,
}

impl TransitionCallback for ImportRelay {
    fn on_validate(&self, result: Result<(), BlockManagerError>) {
        if let Err(err) = result {
            self.cb.on_result(Err(err));
        }
    }

    fn on_execute(&self, result: Result<TransitionOutput, BlockManagerError>) {
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                self.cb.on_result(Err(err));
                return;
            }
        };
        if output.next_result != self.block.result || output.next_validators != self.block.next_validators {
            self.cb.on_result(Err(BlockManagerError::ResultMismatch));
            return;
        }
        self.assembled.lock().expect("assembled mutex poisoned").insert(
            self.block.id(),
            Assembled { state_root: output.state_root, patch_receipts: output.patch_receipts, normal_receipts: output.normal_receipts },
        );
        self.cb.on_result(Ok(self.block.clone()));
    }
}
