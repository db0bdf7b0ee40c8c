// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde::{Deserialize, Serialize};
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use crate::actors::builtin::make_map_with_root;
use crate::db::Ipld;
use crate::runtime::ActorError;
use crate::shim::MethodNum;
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::version::ActorVersion;
use crate::utils::encoding::RawBytes;

/// Transaction ID type
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnID(pub i64);

/// Transaction type used in multisig actor
#[derive(Clone, PartialEq, Eq, Debug, Serialize_tuple, Deserialize_tuple)]
pub struct Transaction {
    pub to: Address,
    pub value: TokenAmount,
    pub method: MethodNum,
    pub params: RawBytes,

    pub approved: Vec<Address>,
}

/// Multisig actor state
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    pub signers: Vec<Address>,
    pub num_approvals_threshold: u64,
    pub next_tx_id: TxnID,

    // Linear unlock
    pub initial_balance: TokenAmount,
    pub start_epoch: ChainEpoch,
    pub unlock_duration: ChainEpoch,

    pub pending_txs: Cid,
}

impl State {
    /// Checks if `address` is in the list of signers
    pub fn is_signer(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }

    /// Sets locked amount in multisig state.
    pub fn set_locked(
        &mut self,
        start_epoch: ChainEpoch,
        unlock_duration: ChainEpoch,
        locked_amount: TokenAmount,
    ) {
        self.start_epoch = start_epoch;
        self.unlock_duration = unlock_duration;
        self.initial_balance = locked_amount;
    }

    /// Removes `addr` from the approvals of every pending transaction and drops transactions
    /// left without approvals.
    pub fn purge_approvals<BS: Ipld>(
        &mut self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<(), ActorError> {
        let mut txns = make_map_with_root::<_, Transaction>(&self.pending_txs, store, version)?;

        for (key, mut txn) in txns.entries()? {
            if !txn.approved.contains(addr) {
                continue;
            }
            txn.approved.retain(|approver| approver != addr);
            if txn.approved.is_empty() {
                txns.delete(&key.0)?;
            } else {
                txns.set(key, txn)?;
            }
        }

        self.pending_txs = txns.flush()?;
        Ok(())
    }
}
