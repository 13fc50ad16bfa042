// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

use bc_crypto::Address;
use bc_failure_ext::{format_err, Result};
use bc_types::ValidatorList;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::convert::TryFrom;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct GenesisConfig {
    // Hex-encoded (with or without a leading "0x") validator addresses,
    // in the order the genesis `ValidatorList` is built from.
    pub validators: Vec<String>,
    // Hex-encoded addresses a transaction's `from` is never allowed to
    // be; checked at the Validate phase, ahead of execution.
    pub blacklist: Vec<String>,
    pub timestamp: i64,
}

impl GenesisConfig {
    pub fn validator_list(&self) -> Result<ValidatorList> {
        let mut addresses = Vec::with_capacity(self.validators.len());
        for entry in &self.validators {
            let bytes = hex::decode(entry.trim_start_matches("0x"))
                .map_err(|e| format_err!("invalid validator address {:?}: {}", entry, e))?;
            addresses.push(
                Address::try_from(bytes.as_slice())
                    .map_err(|e| format_err!("invalid validator address {:?}: {}", entry, e))?,
            );
        }
        Ok(ValidatorList::new(addresses))
    }

    pub fn blacklist_set(&self) -> Result<HashSet<Address>> {
        let mut addresses = HashSet::with_capacity(self.blacklist.len());
        for entry in &self.blacklist {
            let bytes = hex::decode(entry.trim_start_matches("0x"))
                .map_err(|e| format_err!("invalid blacklisted address {:?}: {}", entry, e))?;
            addresses.insert(
                Address::try_from(bytes.as_slice())
                    .map_err(|e| format_err!("invalid blacklisted address {:?}: {}", entry, e))?,
            );
        }
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_crypto::test_utils::deterministic_private_key;

    #[test]
    fn parses_hex_addresses_into_a_validator_list() {
        let address = deterministic_private_key(1).address();
        let config = GenesisConfig {
            validators: vec![format!("0x{}", hex::encode(address.as_bytes()))],
            blacklist: Vec::new(),
            timestamp: 0,
        };
        let list = config.validator_list().unwrap();
        assert_eq!(list.as_slice(), &[address]);
    }

    #[test]
    fn rejects_malformed_hex() {
        let config = GenesisConfig { validators: vec!["not-hex".to_string()], blacklist: Vec::new(), timestamp: 0 };
        assert!(config.validator_list().is_err());
    }

    #[test]
    fn parses_hex_addresses_into_a_blacklist_set() {
        let address = deterministic_private_key(1).address();
        let config = GenesisConfig {
            validators: Vec::new(),
            blacklist: vec![format!("0x{}", hex::encode(address.as_bytes()))],
            timestamp: 0,
        };
        let set = config.blacklist_set().unwrap();
        assert!(set.contains(&address));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn rejects_malformed_blacklist_hex() {
        let config =
            GenesisConfig { validators: Vec::new(), blacklist: vec!["not-hex".to_string()], timestamp: 0 };
        assert!(config.blacklist_set().is_err());
    }
}
