// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::types::{self, EPOCH_UNDEFINED, WorkerKeyChange};
use crate::actor_error;
use crate::runtime::ActorError;
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::sector::{RegisteredSealProof, SectorSize};
use crate::utils::bitfield::BitField;
use crate::utils::encoding::BytesDe;

/// Static information about miner
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct MinerInfo {
    /// Account that owns this miner
    /// - Income and returned collateral are paid to this address
    /// - This address is also allowed to change the worker address for the miner
    pub owner: Address,
    /// Worker account for this miner
    /// This will be the key that is used to sign blocks created by this miner, and
    /// sign messages sent on behalf of this miner to commit sectors, submit PoSts, and
    /// other day to day miner activities
    pub worker: Address,
    /// Additional addresses that are permitted to submit messages controlling this actor
    pub control_addresses: Vec<Address>,
    pub pending_worker_key: Option<WorkerKeyChange>,
    /// Libp2p identity that should be used when connecting to this miner
    #[serde(with = "serde_bytes")]
    pub peer_id: Vec<u8>,
    /// Vec of byte vectors representing Libp2p multi-addresses used for establishing a
    /// connection with this miner.
    pub multiaddrs: Vec<BytesDe>,
    /// The proof type used by this miner for sealing sectors.
    pub seal_proof_type: RegisteredSealProof,
    /// Amount of space in each sector committed to the network by this miner
    pub sector_size: SectorSize,
    /// The number of sectors in each Window PoSt partition (proof).
    pub window_post_partition_sectors: u64,
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
            window_post_proof_type: info.seal_proof_type.registered_window_post_proof(),
            sector_size: info.sector_size,
            window_post_partition_sectors: info.window_post_partition_sectors,
            consensus_fault_elapsed: EPOCH_UNDEFINED,
            pending_owner_address: None,
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
        })
    }
}

/// Balance of Miner Actor should be greater than or equal to
/// the sum of PreCommitDeposits and LockedFunds.
/// It is possible for balance to fall below the sum of PCD, LF and
/// InitialPledgeRequirements, and this is a bad state (IP Debt)
/// that limits a miner actor's behavior (i.e. no balance withdrawals)
/// Excess balance as computed by st.GetAvailableBalance will be
/// withdrawable or usable for pre-commit deposit or pledge lock-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    /// Contains static info about this miner
    pub info: Cid,
    /// Total funds locked as pre_commit_deposit
    pub pre_commit_deposits: TokenAmount,
    /// Total rewards and added funds locked in vesting table
    pub locked_funds: TokenAmount,
    /// VestingFunds (Vesting Funds schedule for the miner).
    pub vesting_funds: Cid,
    /// Sum of initial pledge requirements of all active sectors
    pub initial_pledge_requirement: TokenAmount,
    /// Sectors that have been pre-committed but not yet proven.
    pub pre_committed_sectors: Cid,
    pub pre_committed_sectors_expiry: Cid,
    /// Allocated sector IDs. Sector IDs can never be reused once allocated.
    pub allocated_sectors: Cid,
    /// Information for all proven and not-yet-garbage-collected sectors.
    pub sectors: Cid,
    /// The first epoch in this miner's current proving period.
    pub proving_period_start: ChainEpoch,
    /// Index of the deadline within the proving period beginning at ProvingPeriodStart
    /// that has not yet been finalized.
    pub current_deadline: u64,
    /// The sector numbers due for PoSt at each deadline in the current proving period.
    pub deadlines: Cid,
    /// Deadlines with outstanding fees for early sector termination.
    pub early_terminations: BitField,
}

impl State {
    pub fn new(info: Cid, empty_map: Cid, empty_array: Cid, allocated_sectors: Cid) -> Self {
        Self {
            info,
            pre_commit_deposits: TokenAmount::zero(),
            locked_funds: TokenAmount::zero(),
            vesting_funds: empty_array,
            initial_pledge_requirement: TokenAmount::zero(),
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
