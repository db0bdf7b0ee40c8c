// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;

use crate::actor_error;
use crate::actors::builtin::{Map, make_map_with_root};
use crate::db::Ipld;
use crate::runtime::ActorError;
use crate::shim::address::Address;
use crate::shim::econ::TokenAmount;
use crate::shim::version::ActorVersion;

/// Balance table which handles getting and updating token balances specifically
pub struct BalanceTable<BS>(Map<BS, TokenAmount>);

impl<BS: Ipld> BalanceTable<BS> {
    /// Initializes a balance table from a root Cid
    pub fn from_root(store: BS, cid: &Cid, version: ActorVersion) -> Result<Self, ActorError> {
        Ok(Self(make_map_with_root(cid, store, version)?))
    }

    /// Retrieve root from balance table
    pub fn root(&mut self) -> Result<Cid, ActorError> {
        Ok(self.0.flush()?)
    }

    /// Gets token amount for given address in balance table
    pub fn get(&self, key: &Address) -> Result<TokenAmount, ActorError> {
        Ok(self
            .0
            .get(&key.to_bytes())?
            .cloned()
            .unwrap_or_default())
    }

    /// Adds token amount to previously initialized account.
    pub fn add(&mut self, key: &Address, value: &TokenAmount) -> Result<(), ActorError> {
        let prev = self.get(key)?;
        let sum = prev.clone() + value.clone();
        if sum.is_negative() {
            Err(actor_error!(illegal_state; "new balance in table cannot be negative: {}", sum))
        } else if sum.is_zero() && !prev.is_zero() {
            self.0.delete(&key.to_bytes())?;
            Ok(())
        } else {
            self.0.set(key.to_bytes().into(), sum)?;
            Ok(())
        }
    }

    /// Subtracts up to the specified amount from a balance, without reducing the balance
    /// below some minimum.
    /// Returns the amount subtracted (always positive or zero).
    pub fn subtract_with_minimum(
        &mut self,
        key: &Address,
        req: &TokenAmount,
        floor: &TokenAmount,
    ) -> Result<TokenAmount, ActorError> {
        let prev = self.get(key)?;
        let available = std::cmp::max(TokenAmount::zero(), prev - floor.clone());
        let sub = std::cmp::min(available, req.clone());

        if sub > TokenAmount::zero() {
            self.add(key, &(TokenAmount::zero() - sub.clone()))?;
        }

        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::builtin::make_empty_map;
    use crate::db::MemoryDB;

    #[test]
    fn balance_subtracts() {
        let addr = Address::new_id(100);
        let store = MemoryDB::default();
        let root = make_empty_map::<_, TokenAmount>(&store).unwrap();
        let mut bt = BalanceTable::from_root(&store, &root, ActorVersion::V7).unwrap();

        bt.add(&addr, &TokenAmount::from_atto(80)).unwrap();
        assert_eq!(bt.get(&addr).unwrap(), TokenAmount::from_atto(80));
        // Test subtracting past minimum only subtracts correct amount
        assert_eq!(
            bt.subtract_with_minimum(
                &addr,
                &TokenAmount::from_atto(20),
                &TokenAmount::from_atto(70)
            )
            .unwrap(),
            TokenAmount::from_atto(10)
        );
        assert_eq!(bt.get(&addr).unwrap(), TokenAmount::from_atto(70));

        // Test subtracting to limit
        assert_eq!(
            bt.subtract_with_minimum(
                &addr,
                &TokenAmount::from_atto(10),
                &TokenAmount::from_atto(60)
            )
            .unwrap(),
            TokenAmount::from_atto(10)
        );
        assert_eq!(bt.get(&addr).unwrap(), TokenAmount::from_atto(60));

        // A floor above the balance subtracts nothing
        assert!(
            bt.subtract_with_minimum(
                &addr,
                &TokenAmount::from_atto(10),
                &TokenAmount::from_atto(100)
            )
            .unwrap()
            .is_zero()
        );

        assert!(bt.add(&addr, &TokenAmount::from_atto(-61)).is_err());
    }

    #[test]
    fn emptied_entries_are_removed() {
        let addr = Address::new_id(100);
        let store = MemoryDB::default();
        let root = make_empty_map::<_, TokenAmount>(&store).unwrap();
        let mut bt = BalanceTable::from_root(&store, &root, ActorVersion::V7).unwrap();
        bt.add(&addr, &TokenAmount::from_atto(5)).unwrap();
        bt.add(&addr, &TokenAmount::from_atto(-5)).unwrap();
        assert_eq!(bt.root().unwrap(), root);
    }

    #[test]
    fn legacy_table_reloads() {
        let addr = Address::new_id(100);
        let store = MemoryDB::default();
        let root = make_empty_map::<_, TokenAmount>(&store).unwrap();
        let mut bt = BalanceTable::from_root(&store, &root, ActorVersion::V2).unwrap();
        bt.add(&addr, &TokenAmount::from_atto(5)).unwrap();
        let root = bt.root().unwrap();

        let bt = BalanceTable::from_root(&store, &root, ActorVersion::V0).unwrap();
        assert_eq!(bt.get(&addr).unwrap(), TokenAmount::from_atto(5));
        assert!(BalanceTable::from_root(&store, &root, ActorVersion::V3).is_err());
    }
}
