// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::types::{self, WorkerKeyChange};
use crate::actor_error;
use crate::runtime::ActorError;
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::sector::{RegisteredSealProof, SectorSize};
use crate::utils::bitfield::BitField;
use crate::utils::encoding::BytesDe;

/// Static information about miner. Adds consensus fault tracking and owner changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct MinerInfo {
    pub owner: Address,
    pub worker: Address,
    pub control_addresses: Vec<Address>,
    pub pending_worker_key: Option<WorkerKeyChange>,
    #[serde(with = "serde_bytes")]
    pub peer_id: Vec<u8>,
    pub multiaddrs: Vec<BytesDe>,
    pub seal_proof_type: RegisteredSealProof,
    pub sector_size: SectorSize,
    pub window_post_partition_sectors: u64,
    /// The next epoch this miner is eligible for certain permissioned actor methods
    /// and winning block elections as a result of being reported for a consensus fault.
    pub consensus_fault_elapsed: ChainEpoch,
    /// A proposed new owner account for this miner.
    /// Must be confirmed by a message from the pending address itself.
    pub pending_owner_address: Option<Address>,
}

impl From<MinerInfo> for types::MinerInfo {
    fn from(info: MinerInfo) -> Self {
        Self {
            owner: info.owner,
            worker: info.worker,
            control_addresses: info.control_addresses,
            pending_worker_key: info.pending_worker_key,
            peer_id: info.peer_id,
            multiaddrs: info.multiaddrs,
            seal_proof_type: Some(info.seal_proof_type),
            // not stored, derived from the seal proof on every read
            window_post_proof_type: info.seal_proof_type.registered_window_post_proof(),
            sector_size: info.sector_size,
            window_post_partition_sectors: info.window_post_partition_sectors,
            consensus_fault_elapsed: info.consensus_fault_elapsed,
            pending_owner_address: info.pending_owner_address,
        }
    }
}

impl TryFrom<types::MinerInfo> for MinerInfo {
    type Error = ActorError;

    fn try_from(info: types::MinerInfo) -> Result<Self, ActorError> {
        let seal_proof_type = info
            .seal_proof_type
            .ok_or_else(|| actor_error!(illegal_state; "miner info has no seal proof type"))?;
        Ok(Self {
            owner: info.owner,
            worker: info.worker,
            control_addresses: info.control_addresses,
            pending_worker_key: info.pending_worker_key,
            peer_id: info.peer_id,
            multiaddrs: info.multiaddrs,
            seal_proof_type,
            sector_size: info.sector_size,
            window_post_partition_sectors: info.window_post_partition_sectors,
            consensus_fault_elapsed: info.consensus_fault_elapsed,
            pending_owner_address: info.pending_owner_address,
        })
    }
}

/// Miner state. Tracks fee debt and renames the pledge requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    pub info: Cid,
    pub pre_commit_deposits: TokenAmount,
    pub locked_funds: TokenAmount,
    pub vesting_funds: Cid,
    /// Absolute value of debt this miner owes from unpaid fees.
    pub fee_debt: TokenAmount,
    pub initial_pledge: TokenAmount,
    pub pre_committed_sectors: Cid,
    pub pre_committed_sectors_expiry: Cid,
    pub allocated_sectors: Cid,
    pub sectors: Cid,
    pub proving_period_start: ChainEpoch,
    pub current_deadline: u64,
    pub deadlines: Cid,
    pub early_terminations: BitField,
}

impl State {
    pub fn new(info: Cid, empty_map: Cid, empty_array: Cid, allocated_sectors: Cid) -> Self {
        Self {
            info,
            pre_commit_deposits: TokenAmount::zero(),
            locked_funds: TokenAmount::zero(),
            vesting_funds: empty_array,
            fee_debt: TokenAmount::zero(),
            initial_pledge: TokenAmount::zero(),
            pre_committed_sectors: empty_map,
            pre_committed_sectors_expiry: empty_array,
            allocated_sectors,
            sectors: empty_array,
            proving_period_start: 0,
            current_deadline: 0,
            deadlines: empty_array,
            early_terminations: BitField::new(),
        }
    }
}
