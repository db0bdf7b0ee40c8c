// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::types::{self, WorkerKeyChange};
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::sector::{RegisteredPoStProof, SectorSize};
use crate::utils::encoding::BytesDe;

/// The state layout is unchanged, only the info it links to differs.
pub use super::v2::State;

/// Static information about miner. The window PoSt proof replaces the seal proof and is
/// stored as chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct MinerInfo {
    pub owner: Address,
    pub worker: Address,
    pub control_addresses: Vec<Address>,
    pub pending_worker_key: Option<WorkerKeyChange>,
    #[serde(with = "serde_bytes")]
    pub peer_id: Vec<u8>,
    pub multiaddrs: Vec<BytesDe>,
    /// The proof type used for Window PoSt for this miner.
    /// A miner may commit sectors with different seal proof types (but compatible sector
    /// size and corresponding PoSt proof types).
    pub window_post_proof_type: RegisteredPoStProof,
    pub sector_size: SectorSize,
    pub window_post_partition_sectors: u64,
    pub consensus_fault_elapsed: ChainEpoch,
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
            seal_proof_type: None,
            window_post_proof_type: info.window_post_proof_type,
            sector_size: info.sector_size,
            window_post_partition_sectors: info.window_post_partition_sectors,
            consensus_fault_elapsed: info.consensus_fault_elapsed,
            pending_owner_address: info.pending_owner_address,
        }
    }
}

impl From<types::MinerInfo> for MinerInfo {
    fn from(info: types::MinerInfo) -> Self {
        Self {
            owner: info.owner,
            worker: info.worker,
            control_addresses: info.control_addresses,
            pending_worker_key: info.pending_worker_key,
            peer_id: info.peer_id,
            multiaddrs: info.multiaddrs,
            window_post_proof_type: info.window_post_proof_type,
            sector_size: info.sector_size,
            window_post_partition_sectors: info.window_post_partition_sectors,
            consensus_fault_elapsed: info.consensus_fault_elapsed,
            pending_owner_address: info.pending_owner_address,
        }
    }
}
