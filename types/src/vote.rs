// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Vote sets committing a proposed or imported block's parent. Consensus
//! itself (how a quorum of votes gets collected) is out of scope; this
//! module only checks that a given vote set actually commits to a given
//! parent with a quorum from that parent's validator set.

use crate::error::BlockManagerError;
use crate::merkle_list;
use crate::validator::ValidatorList;
use bc_crypto::{Address, HashValue, Signature};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub validator: Address,
    pub block_id: HashValue,
    pub signature: Signature,
}

impl Vote {
    /// `true` iff the signature recovers to `self.validator` over
    /// `self.block_id`.
    pub fn is_well_formed(&self) -> bool {
        matches!(self.signature.recover_address(&self.block_id), Ok(addr) if addr == self.validator)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct VoteSet {
    votes: Vec<Vote>,
}

impl VoteSet {
    pub fn new(votes: Vec<Vote>) -> Self {
        Self { votes }
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    /// `votes_hash` as it appears in a block header: the trie root over
    /// `index -> vote encoding`.
    pub fn hash(&self) -> HashValue {
        merkle_list::root_over(
            self.votes.iter().map(|v| bc_lcs::to_bytes(v).expect("Vote always encodes")),
        )
    }

    /// Checks that every vote is well-formed, commits to `parent_id`,
    /// comes from a distinct member of `validators`, and that together
    /// they carry better than 2/3 of `validators`' weight (consensus is
    /// otherwise opaque to this core; a strict Byzantine-quorum threshold
    /// is the only shape of "sufficient quorum" it assumes).
    pub fn verify_commits(
        &self,
        parent_id: HashValue,
        validators: &ValidatorList,
    ) -> Result<(), BlockManagerError> {
        let mut seen = HashSet::new();
        for vote in &self.votes {
            if vote.block_id != parent_id {
                return Err(BlockManagerError::BadVoteSet);
            }
            if !validators.contains(&vote.validator) {
                return Err(BlockManagerError::BadVoteSet);
            }
            if !seen.insert(vote.validator) {
                return Err(BlockManagerError::BadVoteSet);
            }
            if !vote.is_well_formed() {
                return Err(BlockManagerError::BadVoteSet);
            }
        }
        if seen.len() * 3 <= validators.len() * 2 {
            return Err(BlockManagerError::BadVoteSet);
        }
        Ok(())
    }
}
