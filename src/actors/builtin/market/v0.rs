// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::balance_table::BalanceTable;
use crate::db::Ipld;
use crate::runtime::ActorError;
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::version::ActorVersion;

pub type DealID = u64;

/// Market actor state
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    /// Amt<DealID, DealProposal>
    pub proposals: Cid,
    /// Amt<DealID, DealState>
    pub states: Cid,
    /// PendingProposals tracks proposals that have not yet reached their deal start date.
    pub pending_proposals: Cid,
    /// Total amount held in escrow, indexed by actor address (including both locked and
    /// unlocked amounts).
    pub escrow_table: Cid,
    /// Amount locked, indexed by actor address.
    pub locked_table: Cid,
    /// Deal id state sequential incrementer
    pub next_id: DealID,
    /// Metadata cached for efficient iteration over deals.
    pub deal_ops_by_epoch: Cid,
    pub last_cron: ChainEpoch,

    /// Total Client Collateral that is locked -> unlocked when deal is terminated
    pub total_client_locked_collateral: TokenAmount,
    /// Total Provider Collateral that is locked -> unlocked when deal is terminated
    pub total_provider_locked_collateral: TokenAmount,
    /// Total storage fee that is locked in escrow -> unlocked when payments are made
    pub total_client_storage_fee: TokenAmount,
}

impl State {
    pub fn new(empty_map: Cid, empty_array: Cid) -> Self {
        Self {
            proposals: empty_array,
            states: empty_array,
            pending_proposals: empty_map,
            escrow_table: empty_map,
            locked_table: empty_map,
            next_id: 0,
            deal_ops_by_epoch: empty_map,
            last_cron: -1,
            total_client_locked_collateral: TokenAmount::zero(),
            total_provider_locked_collateral: TokenAmount::zero(),
            total_client_storage_fee: TokenAmount::zero(),
        }
    }

    pub fn escrow_balance<BS: Ipld>(
        &self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<TokenAmount, ActorError> {
        BalanceTable::from_root(store, &self.escrow_table, version)?.get(addr)
    }

    pub fn locked_balance<BS: Ipld>(
        &self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<TokenAmount, ActorError> {
        BalanceTable::from_root(store, &self.locked_table, version)?.get(addr)
    }

    /// Credits `amount` to the escrow of `addr`, opening a locked entry for it if needed.
    pub fn add_escrow<BS: Ipld + Copy>(
        &mut self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
        amount: &TokenAmount,
    ) -> Result<(), ActorError> {
        let mut escrow = BalanceTable::from_root(store, &self.escrow_table, version)?;
        escrow.add(addr, amount)?;
        self.escrow_table = escrow.root()?;

        let mut locked = BalanceTable::from_root(store, &self.locked_table, version)?;
        locked.add(addr, &TokenAmount::zero())?;
        self.locked_table = locked.root()?;
        Ok(())
    }

    /// Removes up to `amount` of unlocked escrow from `addr` and returns what was removed.
    pub fn withdraw_escrow<BS: Ipld + Copy>(
        &mut self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
        amount: &TokenAmount,
    ) -> Result<TokenAmount, ActorError> {
        let min_balance = self.locked_balance(store, version, addr)?;
        let mut escrow = BalanceTable::from_root(store, &self.escrow_table, version)?;
        let extracted = escrow.subtract_with_minimum(addr, amount, &min_balance)?;
        self.escrow_table = escrow.root()?;
        Ok(extracted)
    }
}
