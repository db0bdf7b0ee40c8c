// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

use crate::shim::clock::{ChainEpoch, EPOCHS_IN_HOUR};
use crate::shim::sector::{RegisteredPoStProof, RegisteredSealProof};

/// Protocol constants that vary between networks. The policy is owned by the VM and read
/// by actors through [`crate::runtime::Runtime::policy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Epochs between a payment channel entering settlement and its collection.
    pub payment_channel_settle_delay: ChainEpoch,
    /// Smallest allowance a verified client may be granted, in bytes.
    pub minimum_verified_deal_size: u64,
    /// Seal proofs new miners may be created with.
    pub supported_seal_proof_types: Vec<RegisteredSealProof>,
    /// Raw byte power a miner needs before it counts towards consensus.
    pub consensus_miner_min_power: u64,
    /// Maximum number of control addresses a miner may set.
    pub max_control_addresses: usize,
    /// Maximum length of a miner peer ID in bytes.
    pub max_peer_id_length: usize,
    /// Maximum total size of a miner's multiaddresses in bytes.
    pub max_multiaddr_data: usize,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            payment_channel_settle_delay: EPOCHS_IN_HOUR * 12,
            minimum_verified_deal_size: 1 << 20,
            supported_seal_proof_types: vec![
                RegisteredSealProof::StackedDRG32GiBV1,
                RegisteredSealProof::StackedDRG64GiBV1,
                RegisteredSealProof::StackedDRG32GiBV1P1,
                RegisteredSealProof::StackedDRG64GiBV1P1,
            ],
            consensus_miner_min_power: 10 << 40,
            max_control_addresses: 10,
            max_peer_id_length: 128,
            max_multiaddr_data: 1024,
        }
    }
}

impl Policy {
    pub fn is_supported_seal_proof(&self, proof: RegisteredSealProof) -> bool {
        self.supported_seal_proof_types.contains(&proof)
    }

    /// A window PoSt proof is supported if some supported seal proof maps to it.
    pub fn is_supported_window_post_proof(&self, proof: RegisteredPoStProof) -> bool {
        self.supported_seal_proof_types
            .iter()
            .any(|seal| seal.registered_window_post_proof() == proof)
    }

    /// Policy used by test networks: small sectors and short delays.
    pub fn devnet() -> Self {
        Self {
            payment_channel_settle_delay: 10,
            minimum_verified_deal_size: 256,
            supported_seal_proof_types: vec![
                RegisteredSealProof::StackedDRG2KiBV1,
                RegisteredSealProof::StackedDRG2KiBV1P1,
                RegisteredSealProof::StackedDRG8MiBV1,
                RegisteredSealProof::StackedDRG8MiBV1P1,
            ],
            consensus_miner_min_power: 2048,
            ..Default::default()
        }
    }
}
