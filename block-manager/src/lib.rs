// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The block manager: the canonical-chain keeper that validates and
//! persists blocks, driving `bc_executor::Transition` to turn a proposed
//! or imported block's transactions into a new state root and receipts.

pub mod manager;
pub mod wallet;

pub use manager::{BlockCallback, BlockManager};
pub use wallet::{LocalWallet, Wallet};

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;
    use bc_crypto::HashValue;
    use bc_executor::{Connection, Dispatcher, Handler, NoPatches};
    use bc_mempool::Mempool;
    use bc_schemadb::{Db, MemDb, TrieNodeStore};
    use bc_types::error::BlockManagerError;
    use bc_types::transaction::{RawTransaction, Transaction, TransactionData};
    use bc_types::validator::ValidatorList;
    use bc_types::vote::{Vote, VoteSet};
    use primitive_types::U256;
    use std::collections::HashSet;
    use std::sync::{Arc, Condvar, Mutex};
    use std::time::Duration;

    struct NoopDispatcher;
    impl Dispatcher for NoopDispatcher {
        fn dispatch(&self, _handler: &Handler, _connection: &Connection) {}
    }

    struct WaitingCallback {
        result: Mutex<Option<Result<bc_types::block::Block, BlockManagerError>>>,
        done: Condvar,
    }

    impl WaitingCallback {
        fn new() -> Arc<Self> {
            Arc::new(Self { result: Mutex::new(None), done: Condvar::new() })
        }

        fn wait(&self) -> Result<bc_types::block::Block, BlockManagerError> {
            let mut slot = self.result.lock().expect("callback lock poisoned");
            while slot.is_none() {
                slot = self.done.wait(slot).expect("callback lock poisoned");
            }
            slot.take().expect("checked Some above")
        }
    }

    impl BlockCallback for WaitingCallback {
        fn on_result(&self, result: Result<bc_types::block::Block, BlockManagerError>) {
            *self.result.lock().expect("callback lock poisoned") = Some(result);
            self.done.notify_all();
        }
    }

    fn new_manager() -> (BlockManager, Arc<Mempool>, Vec<bc_crypto::PrivateKey>) {
        let db: Arc<dyn Db> = Arc::new(MemDb::new());
        let store = Arc::new(TrieNodeStore::new(db.clone()));
        let mempool = Arc::new(Mempool::new(bc_config::MempoolConfig::default()));
        let validator_keys: Vec<_> = (0..4).map(deterministic_private_key).collect();
        let proposer = deterministic_private_key(1000);
        let wallet = Arc::new(LocalWallet::new(proposer));
        let manager = BlockManager::new(
            db,
            store,
            mempool.clone(),
            wallet,
            Arc::new(NoPatches),
            bc_config::StepConfig::default(),
            Duration::from_secs(5),
            Arc::new(NoopDispatcher),
            Arc::new(HashSet::new()),
        );
        let validators = ValidatorList::new(validator_keys.iter().map(|k| k.address()));
        manager.init_genesis(validators, Vec::new(), HashValue::zero(), 0).unwrap();
        (manager, mempool, validator_keys)
    }

    fn votes_for(parent_id: HashValue, validator_keys: &[bc_crypto::PrivateKey]) -> VoteSet {
        VoteSet::new(
            validator_keys
                .iter()
                .map(|k| Vote { validator: k.address(), block_id: parent_id, signature: k.sign(&parent_id).unwrap() })
                .collect(),
        )
    }

    fn signed_transfer(seed: u64, to: bc_crypto::Address, value: U256) -> Transaction {
        let key = deterministic_private_key(seed);
        let raw = RawTransaction {
            version: 1,
            from: key.address(),
            to: Some(to),
            value,
            step_limit: 1_000,
            step_price: U256::from(1u64),
            nonce: 0,
            data: TransactionData::Transfer,
        };
        let signature = key.sign(&raw.hash()).unwrap();
        Transaction { raw, signature }
    }

    #[test]
    fn genesis_is_immediately_the_last_block() {
        let (manager, _mempool, _validator_keys) = new_manager();
        let last = manager.get_last_block().unwrap().unwrap();
        assert_eq!(last.height, 0);
        assert!(last.is_genesis());
    }

    #[test]
    fn propose_then_finalize_advances_the_chain() {
        let (manager, mempool, validator_keys) = new_manager();
        let genesis_id = manager.get_last_block().unwrap().unwrap().id();
        let recipient = deterministic_private_key(2000).address();
        mempool.insert(signed_transfer(1, recipient, U256::zero())).unwrap();

        let callback = WaitingCallback::new();
        let _canceler = manager.propose(genesis_id, votes_for(genesis_id, &validator_keys), callback.clone()).unwrap();
        let block = callback.wait().unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(block.normal_txs.len(), 1);

        manager.finalize(&block).unwrap();
        let last = manager.get_last_block().unwrap().unwrap();
        assert_eq!(last.id(), block.id());
        assert_eq!(manager.get_block_by_height(1).unwrap().unwrap().id(), block.id());
        assert!(!mempool.contains(&block.normal_txs.as_slice()[0].id()));
    }

    #[test]
    fn propose_on_unknown_parent_fails_synchronously() {
        let (manager, _mempool, validator_keys) = new_manager();
        let bogus_parent = HashValue::sha3_256_of(b"never finalized");
        let callback = WaitingCallback::new();
        let result = manager.propose(bogus_parent, votes_for(bogus_parent, &validator_keys), callback);
        assert!(matches!(result, Err(BlockManagerError::BadParent)));
    }

    #[test]
    fn propose_with_insufficient_votes_fails_synchronously() {
        let (manager, _mempool, validator_keys) = new_manager();
        let genesis_id = manager.get_last_block().unwrap().unwrap().id();
        let short_votes = VoteSet::new(votes_for(genesis_id, &validator_keys).votes()[..1].to_vec());
        let callback = WaitingCallback::new();
        let result = manager.propose(genesis_id, short_votes, callback);
        assert!(matches!(result, Err(BlockManagerError::BadVoteSet)));
    }

    #[test]
    fn finalize_out_of_height_order_is_rejected() {
        let (manager, _mempool, _validator_keys) = new_manager();
        let genesis = manager.get_last_block().unwrap().unwrap();
        let mut bogus = genesis.clone();
        bogus.height = 5;
        assert!(matches!(manager.finalize(&bogus), Err(BlockManagerError::NonContiguous)));
    }

    #[test]
    fn propose_then_import_reproduces_the_same_block() {
        let (manager, mempool, validator_keys) = new_manager();
        let genesis_id = manager.get_last_block().unwrap().unwrap().id();
        let recipient = deterministic_private_key(3000).address();
        mempool.insert(signed_transfer(5, recipient, U256::zero())).unwrap();

        let proposed = {
            let callback = WaitingCallback::new();
            manager.propose(genesis_id, votes_for(genesis_id, &validator_keys), callback.clone()).unwrap();
            callback.wait().unwrap()
        };
        manager.finalize(&proposed).unwrap();

        let (importer, _import_mempool, _import_validator_keys) = {
            let db: Arc<dyn Db> = Arc::new(MemDb::new());
            let store = Arc::new(TrieNodeStore::new(db.clone()));
            let mempool = Arc::new(Mempool::new(bc_config::MempoolConfig::default()));
            let wallet = Arc::new(LocalWallet::new(deterministic_private_key(1000)));
            let importer = BlockManager::new(
                db,
                store,
                mempool.clone(),
                wallet,
                Arc::new(NoPatches),
                bc_config::StepConfig::default(),
                Duration::from_secs(5),
                Arc::new(NoopDispatcher),
                Arc::new(HashSet::new()),
            );
            let validators = ValidatorList::new(validator_keys.iter().map(|k| k.address()));
            importer.init_genesis(validators, Vec::new(), HashValue::zero(), 0).unwrap();
            (importer, mempool, validator_keys.clone())
        };

        let callback = WaitingCallback::new();
        importer.import(&proposed.encode_header(), &proposed.encode_body(), callback.clone()).unwrap();
        let imported = callback.wait().unwrap();
        assert_eq!(imported.id(), proposed.id());
        importer.finalize(&imported).unwrap();
        assert_eq!(importer.get_last_block().unwrap().unwrap().id(), proposed.id());
    }
}
