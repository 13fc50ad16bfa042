// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Transaction/receipt status codes. A handful are reserved by the core;
//! everything else is a user-contract-defined code that passes through
//! unchanged between the executor and the receipt it lands in.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(0);
    pub const NOT_PAYABLE: StatusCode = StatusCode(0x7d64);
    pub const OUT_OF_BALANCE: StatusCode = StatusCode(0x7f58);
    pub const SYSTEM_ERROR: StatusCode = StatusCode(0x7000);
    pub const TIMEOUT: StatusCode = StatusCode(0x7001);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SUCCESS => write!(f, "Success"),
            Self::NOT_PAYABLE => write!(f, "NotPayable"),
            Self::OUT_OF_BALANCE => write!(f, "OutOfBalance"),
            Self::SYSTEM_ERROR => write!(f, "SystemError"),
            Self::TIMEOUT => write!(f, "Timeout"),
            StatusCode(code) => write!(f, "StatusCode({:#x})", code),
        }
    }
}
