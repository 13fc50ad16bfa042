// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{de, ser};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Eof,
    ExpectedBoolean,
    ExpectedMapKey,
    ExpectedMapValue,
    NonCanonicalMap,
    NonCanonicalVarint,
    VarintOverflow,
    Utf8,
    NotSupported(&'static str),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Eof => write!(f, "unexpected end of input"),
            Error::ExpectedBoolean => write!(f, "expected 0 or 1 for a boolean"),
            Error::ExpectedMapKey => write!(f, "expected map key"),
            Error::ExpectedMapValue => write!(f, "expected map value"),
            Error::NonCanonicalMap => write!(f, "map keys were not in canonical (sorted) order"),
            Error::NonCanonicalVarint => write!(f, "non-canonical varint encoding"),
            Error::VarintOverflow => write!(f, "varint does not fit in a u64"),
            Error::Utf8 => write!(f, "invalid utf-8 in string"),
            Error::NotSupported(what) => write!(f, "type not supported by LCS: {}", what),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}
