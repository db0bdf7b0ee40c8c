// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::sector::{RegisteredPoStProof, RegisteredSealProof, SectorSize};
use crate::utils::encoding::{BytesDe, Cbor};

/// Sentinel for epochs that have not been set.
pub const EPOCH_UNDEFINED: ChainEpoch = -1;

/// Storage miner actor constructor params are defined here so the power actor can send
/// them to the init actor to instantiate miners. Miners created before actor version 3
/// name their seal proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ConstructorParamsV0 {
    pub owner: Address,
    pub worker: Address,
    pub control_addresses: Vec<Address>,
    pub seal_proof_type: RegisteredSealProof,
    #[serde(with = "serde_bytes")]
    pub peer_id: Vec<u8>,
    pub multiaddrs: Vec<BytesDe>,
}

impl Cbor for ConstructorParamsV0 {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ConstructorParams {
    pub owner: Address,
    pub worker: Address,
    pub control_addresses: Vec<Address>,
    pub window_post_proof_type: RegisteredPoStProof,
    #[serde(with = "serde_bytes")]
    pub peer_id: Vec<u8>,
    pub multiaddrs: Vec<BytesDe>,
}

impl Cbor for ConstructorParams {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct GetControlAddressesReturn {
    pub owner: Address,
    pub worker: Address,
    pub control_addresses: Vec<Address>,
}

impl Cbor for GetControlAddressesReturn {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ChangePeerIDParams {
    #[serde(with = "serde_bytes")]
    pub new_id: Vec<u8>,
}

impl Cbor for ChangePeerIDParams {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ChangeMultiaddrsParams {
    pub new_multi_addrs: Vec<BytesDe>,
}

impl Cbor for ChangeMultiaddrsParams {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct WorkerKeyChange {
    /// Must be an ID address
    pub new_worker: Address,
    pub effective_at: ChainEpoch,
}

/// Miner info as seen by callers, whatever layout it is stored with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerInfo {
    pub owner: Address,
    pub worker: Address,
    pub control_addresses: Vec<Address>,
    pub pending_worker_key: Option<WorkerKeyChange>,
    pub peer_id: Vec<u8>,
    pub multiaddrs: Vec<BytesDe>,
    /// Only recorded by miners created before actor version 3.
    pub seal_proof_type: Option<RegisteredSealProof>,
    pub window_post_proof_type: RegisteredPoStProof,
    pub sector_size: SectorSize,
    pub window_post_partition_sectors: u64,
    pub consensus_fault_elapsed: ChainEpoch,
    pub pending_owner_address: Option<Address>,
}

impl MinerInfo {
    /// Addresses allowed to manage the miner.
    pub fn controlling_addresses(&self) -> Vec<Address> {
        let mut addrs = self.control_addresses.clone();
        addrs.push(self.owner);
        addrs.push(self.worker);
        addrs
    }
}
