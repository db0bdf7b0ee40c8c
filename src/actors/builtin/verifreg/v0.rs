// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use crate::shim::address::Address;

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    pub root_key: Address,
    /// Maps verifier addresses to data cap minting allowance (in bytes).
    pub verifiers: Cid,
    /// Maps client addresses to the data cap they may still spend (in bytes).
    pub verified_clients: Cid,
}

impl State {
    pub fn new(root_key: Address, empty_map: Cid) -> Self {
        Self {
            root_key,
            verifiers: empty_map,
            verified_clients: empty_map,
        }
    }
}
