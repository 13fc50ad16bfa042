// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Address and signature primitives. Addresses are the last 20 bytes of
//! the SHA3-256 hash of an uncompressed secp256k1 public key; signatures
//! are 65-byte recoverable ECDSA signatures (`r ‖ s ‖ v`), matching the
//! wallet scheme assumed by the block and transaction formats.

use crate::hash::HashValue;
use bc_failure_ext::{ensure, format_err, Result};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

pub const ADDRESS_LENGTH: usize = 20;
pub const SIGNATURE_LENGTH: usize = 65;

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn zero() -> Self {
        Self([0u8; ADDRESS_LENGTH])
    }

    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let hash = HashValue::sha3_256_of(&public_key.to_uncompressed_bytes());
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(&hash.as_bytes()[crate::hash::HASH_LENGTH - ADDRESS_LENGTH..]);
        Self(out)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = bc_failure_ext::Error;
    fn try_from(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() == ADDRESS_LENGTH,
            "address must be {} bytes, got {}",
            ADDRESS_LENGTH,
            bytes.len()
        );
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

#[derive(Clone)]
pub struct PrivateKey(SigningKey);

#[derive(Clone, Eq, PartialEq)]
pub struct PublicKey(VerifyingKey);

impl PrivateKey {
    pub fn generate() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    /// Generates a key from a caller-supplied RNG, so deterministic test
    /// seeds (see `bc_crypto::test_utils`) produce stable keys.
    pub fn generate_for_testing<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Self {
        Self(SigningKey::random(rng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key = SigningKey::from_slice(bytes)
            .map_err(|e| format_err!("invalid private key bytes: {}", e))?;
        Ok(Self(key))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.0.verifying_key())
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Signs `message_hash` (already the SHA3-256 digest of the signed
    /// content, per the block/transaction formats), returning a recoverable
    /// signature.
    pub fn sign(&self, message_hash: &HashValue) -> Result<Signature> {
        let (signature, recovery_id): (EcdsaSignature, RecoveryId) = self
            .0
            .sign_prehash_recoverable(message_hash.as_bytes())
            .map_err(|e| format_err!("signing failed: {}", e))?;
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Ok(Signature(bytes))
    }
}

impl PublicKey {
    pub fn to_uncompressed_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// An all-zero placeholder, used only for the genesis block, which has
    /// no proposer to sign it.
    pub const fn zero() -> Self {
        Self([0u8; SIGNATURE_LENGTH])
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() == SIGNATURE_LENGTH,
            "signature must be {} bytes, got {}",
            SIGNATURE_LENGTH,
            bytes.len()
        );
        let mut out = [0u8; SIGNATURE_LENGTH];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Recovers the address of the signer over `message_hash`. This is the
    /// sole authentication check for a block's proposer signature and for
    /// every transaction's `from` address.
    pub fn recover_address(&self, message_hash: &HashValue) -> Result<Address> {
        let signature = EcdsaSignature::from_slice(&self.0[..64])
            .map_err(|e| format_err!("malformed signature: {}", e))?;
        let recovery_id = RecoveryId::from_byte(self.0[64])
            .ok_or_else(|| format_err!("invalid recovery id byte: {}", self.0[64]))?;
        let verifying_key =
            VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &signature, recovery_id)
                .map_err(|e| format_err!("signature recovery failed: {}", e))?;
        Ok(PublicKey(verifying_key).address())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_the_signer_address() {
        let key = PrivateKey::generate();
        let message = HashValue::sha3_256_of(b"a block id");
        let signature = key.sign(&message).unwrap();
        let recovered = signature.recover_address(&message).unwrap();
        assert_eq!(recovered, key.address());
    }

    #[test]
    fn recovery_fails_on_tampered_hash() {
        let key = PrivateKey::generate();
        let message = HashValue::sha3_256_of(b"original");
        let other = HashValue::sha3_256_of(b"tampered");
        let signature = key.sign(&message).unwrap();
        let recovered = signature.recover_address(&other).unwrap();
        assert_ne!(recovered, key.address());
    }
}
