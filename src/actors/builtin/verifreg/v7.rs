// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use crate::shim::address::Address;

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    pub root_key: Address,
    pub verifiers: Cid,
    pub verified_clients: Cid,
    /// Next removal proposal id per (verifier, client) pair.
    pub remove_data_cap_proposal_ids: Cid,
}

impl State {
    pub fn new(root_key: Address, empty_map: Cid) -> Self {
        Self {
            root_key,
            verifiers: empty_map,
            verified_clients: empty_map,
            remove_data_cap_proposal_ids: empty_map,
        }
    }
}
