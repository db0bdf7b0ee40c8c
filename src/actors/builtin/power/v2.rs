// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use crate::actors::builtin::reward::FilterEstimate;
use crate::shim::StoragePower;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::sector::RegisteredSealProof;
use crate::utils::encoding::bigint_ser;

/// Storage power actor state. The cron cursor of the first layout is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    #[serde(with = "bigint_ser")]
    pub total_raw_byte_power: StoragePower,
    #[serde(with = "bigint_ser")]
    pub total_bytes_committed: StoragePower,
    #[serde(with = "bigint_ser")]
    pub total_quality_adj_power: StoragePower,
    #[serde(with = "bigint_ser")]
    pub total_qa_bytes_committed: StoragePower,
    pub total_pledge_collateral: TokenAmount,

    #[serde(with = "bigint_ser")]
    pub this_epoch_raw_byte_power: StoragePower,
    #[serde(with = "bigint_ser")]
    pub this_epoch_quality_adj_power: StoragePower,
    pub this_epoch_pledge_collateral: TokenAmount,
    pub this_epoch_qa_power_smoothed: FilterEstimate,

    pub miner_count: i64,
    pub miner_above_min_power_count: i64,
    pub cron_event_queue: Cid,
    pub first_cron_epoch: ChainEpoch,
    pub claims: Cid,
    pub proof_validation_batch: Option<Cid>,
}

impl State {
    pub fn new(empty_map: Cid, smoothed: FilterEstimate) -> Self {
        Self {
            total_raw_byte_power: StoragePower::default(),
            total_bytes_committed: StoragePower::default(),
            total_quality_adj_power: StoragePower::default(),
            total_qa_bytes_committed: StoragePower::default(),
            total_pledge_collateral: TokenAmount::zero(),
            this_epoch_raw_byte_power: StoragePower::default(),
            this_epoch_quality_adj_power: StoragePower::default(),
            this_epoch_pledge_collateral: TokenAmount::zero(),
            this_epoch_qa_power_smoothed: smoothed,
            miner_count: 0,
            miner_above_min_power_count: 0,
            cron_event_queue: empty_map,
            first_cron_epoch: 0,
            claims: empty_map,
            proof_validation_batch: None,
        }
    }
}

/// Claims record the seal proof of the miner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct Claim {
    pub seal_proof_type: RegisteredSealProof,
    #[serde(with = "bigint_ser")]
    pub raw_byte_power: StoragePower,
    #[serde(with = "bigint_ser")]
    pub quality_adj_power: StoragePower,
}
