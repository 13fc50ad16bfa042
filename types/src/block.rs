// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The `Block` type and its wire encoding. Unlike accounts and
//! transactions, a block's header/body layout is a fixed, hand-specified
//! byte format rather than the generic LCS encoding -- it's what crosses
//! the wire between nodes and what a block's `id` hashes over, so its
//! shape has to be exact and independent of any serde-derived format.

use crate::receipt::ReceiptList;
use crate::transaction::TransactionList;
use crate::validator::ValidatorList;
use crate::vote::VoteSet;
use bc_crypto::{Address, HashValue, Signature};
use bc_failure_ext::{ensure, format_err, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::convert::{TryFrom, TryInto};

pub const LOG_BLOOM_LENGTH: usize = 256;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Block {
    pub version: u32,
    pub height: i64,
    pub timestamp: i64,
    pub proposer: Address,
    pub prev_id: HashValue,
    pub votes: VoteSet,
    pub patch_txs: TransactionList,
    pub normal_txs: TransactionList,
    pub next_validators: ValidatorList,
    /// `state_root ‖ patch_receipts_root ‖ normal_receipts_root`, opaque to
    /// everything but the transition that produced it.
    pub result: Vec<u8>,
    pub log_bloom: [u8; LOG_BLOOM_LENGTH],
    pub signature: Signature,
}

impl Block {
    /// Builds the genesis block: height 0, empty parent and votes, and
    /// `next_validators` equal to the supplied genesis set.
    pub fn genesis(next_validators: ValidatorList, result: Vec<u8>, timestamp: i64) -> Self {
        Self {
            version: 1,
            height: 0,
            timestamp,
            proposer: Address::zero(),
            prev_id: HashValue::zero(),
            votes: VoteSet::default(),
            patch_txs: TransactionList::default(),
            normal_txs: TransactionList::default(),
            next_validators,
            result,
            log_bloom: [0u8; LOG_BLOOM_LENGTH],
            signature: Signature::zero(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// `SHA3-256` of the header with the trailing signature field omitted
    /// -- what the proposer signs and what the block id is.
    pub fn id(&self) -> HashValue {
        HashValue::sha3_256_of(&self.header_bytes(false))
    }

    /// Checks that `signature` recovers to `proposer` over `id()`. Never
    /// true for the genesis block, which carries no signature.
    pub fn verify_signature(&self) -> bool {
        !self.is_genesis()
            && matches!(self.signature.recover_address(&self.id()), Ok(addr) if addr == self.proposer)
    }

    pub fn encode_header(&self) -> Vec<u8> {
        self.header_bytes(true)
    }

    pub fn encode_body(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_tx_list(&mut out, &self.patch_txs);
        write_tx_list(&mut out, &self.normal_txs);
        write_len_prefixed_vec(&mut out, self.votes.votes().iter().map(|v| bc_lcs::to_bytes(v).expect("a vote always encodes")));
        write_len_prefixed_vec(&mut out, self.next_validators.as_slice().iter().map(|a| a.as_bytes().to_vec()));
        out
    }

    pub fn decode(header: &[u8], body: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(header);
        let version = cursor.take_u32()?;
        let height = cursor.take_i64()?;
        let timestamp = cursor.take_i64()?;
        let proposer = Address::new(cursor.take_array::<20>()?);
        let prev_id = HashValue::new(cursor.take_array::<32>()?);
        let votes_hash = HashValue::new(cursor.take_array::<32>()?);
        let patch_tx_hash = HashValue::new(cursor.take_array::<32>()?);
        let normal_tx_hash = HashValue::new(cursor.take_array::<32>()?);
        let next_validators_hash = HashValue::new(cursor.take_array::<32>()?);
        let log_bloom = cursor.take_array::<LOG_BLOOM_LENGTH>()?;
        let result = cursor.take_len_prefixed()?.to_vec();
        let signature = Signature::from_bytes(cursor.take_array::<65>()?.as_slice())?;
        ensure!(cursor.is_empty(), "trailing bytes in block header");

        let mut body_cursor = Cursor::new(body);
        let patch_txs = read_tx_list(&mut body_cursor)?;
        let normal_txs = read_tx_list(&mut body_cursor)?;
        let votes = read_vote_set(&mut body_cursor)?;
        let next_validators = read_validator_list(&mut body_cursor)?;
        ensure!(body_cursor.is_empty(), "trailing bytes in block body");

        ensure!(patch_txs.hash() == patch_tx_hash, "patch tx list hash mismatch");
        ensure!(normal_txs.hash() == normal_tx_hash, "normal tx list hash mismatch");
        ensure!(votes.hash() == votes_hash, "vote set hash mismatch");
        ensure!(next_validators.hash() == next_validators_hash, "validator list hash mismatch");

        Ok(Self {
            version,
            height,
            timestamp,
            proposer,
            prev_id,
            votes,
            patch_txs,
            normal_txs,
            next_validators,
            result,
            log_bloom,
            signature,
        })
    }

    fn header_bytes(&self, with_signature: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(self.proposer.as_bytes());
        out.extend_from_slice(self.prev_id.as_bytes());
        out.extend_from_slice(self.votes.hash().as_bytes());
        out.extend_from_slice(self.patch_txs.hash().as_bytes());
        out.extend_from_slice(self.normal_txs.hash().as_bytes());
        out.extend_from_slice(self.next_validators.hash().as_bytes());
        out.extend_from_slice(&self.log_bloom);
        write_len_prefixed(&mut out, &self.result);
        if with_signature {
            out.extend_from_slice(self.signature.as_bytes());
        }
        out
    }
}

fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    let mut len = [0u8; 4];
    LittleEndian::write_u32(&mut len, bytes.len() as u32);
    out.extend_from_slice(&len);
    out.extend_from_slice(bytes);
}

fn write_len_prefixed_vec(out: &mut Vec<u8>, items: impl ExactSizeIterator<Item = Vec<u8>>) {
    let mut len = [0u8; 4];
    LittleEndian::write_u32(&mut len, items.len() as u32);
    out.extend_from_slice(&len);
    for item in items {
        write_len_prefixed(out, &item);
    }
}

fn write_tx_list(out: &mut Vec<u8>, list: &TransactionList) {
    write_len_prefixed_vec(
        out,
        list.as_slice().iter().map(|tx| bc_lcs::to_bytes(tx).expect("a transaction always encodes")),
    );
}

fn read_tx_list(cursor: &mut Cursor<'_>) -> Result<TransactionList> {
    let count = cursor.take_u32()?;
    let mut txs = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let bytes = cursor.take_len_prefixed()?;
        txs.push(bc_lcs::from_bytes(bytes).map_err(|e| format_err!("malformed transaction: {}", e))?);
    }
    Ok(TransactionList::new(txs))
}

fn read_vote_set(cursor: &mut Cursor<'_>) -> Result<VoteSet> {
    let count = cursor.take_u32()?;
    let mut votes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let bytes = cursor.take_len_prefixed()?;
        votes.push(bc_lcs::from_bytes(bytes).map_err(|e| format_err!("malformed vote: {}", e))?);
    }
    Ok(VoteSet::new(votes))
}

fn read_validator_list(cursor: &mut Cursor<'_>) -> Result<ValidatorList> {
    let count = cursor.take_u32()?;
    let mut addresses = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let bytes = cursor.take_len_prefixed()?;
        addresses.push(Address::try_from(bytes).map_err(|e| format_err!("malformed validator address: {}", e))?);
    }
    Ok(ValidatorList::new(addresses))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        ensure!(self.pos + len <= self.bytes.len(), "unexpected end of wire data");
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.take(N)?.try_into().map_err(|_| format_err!("array length mismatch"))
    }

    fn take_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn take_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    fn take_len_prefixed(&mut self) -> Result<&'a [u8]> {
        let len = self.take_u32()? as usize;
        self.take(len)
    }
}
