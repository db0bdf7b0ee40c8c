// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use crate::shim::StoragePower;
use crate::shim::sector::RegisteredPoStProof;
use crate::utils::encoding::bigint_ser;

pub use super::v2::State;

/// Claims record the window PoSt proof of the miner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct Claim {
    pub window_post_proof_type: RegisteredPoStProof,
    #[serde(with = "bigint_ser")]
    pub raw_byte_power: StoragePower,
    #[serde(with = "bigint_ser")]
    pub quality_adj_power: StoragePower,
}
