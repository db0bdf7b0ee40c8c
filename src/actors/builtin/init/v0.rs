// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use crate::actors::FIRST_NON_SINGLETON_ADDR;
use crate::db::Ipld;
use crate::ipld::hamt::{Error as HamtError, Hamt};
use crate::shim::ActorID;
use crate::shim::address::Address;
use crate::shim::version::ActorVersion;

/// State is responsible for creating
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    /// Maps robust and key addresses to the ID of the actor they were assigned.
    pub address_map: Cid,
    pub next_id: ActorID,
    pub network_name: String,
}

impl State {
    pub fn new(address_map: Cid, network_name: String) -> Self {
        Self {
            address_map,
            next_id: FIRST_NON_SINGLETON_ADDR,
            network_name,
        }
    }

    /// Allocates a new ID address and stores a mapping of the argument address to it.
    /// Returns the newly-allocated address.
    pub fn map_address_to_new_id<BS: Ipld>(
        &mut self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<Address, HamtError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut map: Hamt<BS, ActorID> =
            Hamt::load_with_version(&self.address_map, store, version.into())?;
        map.set(addr.to_bytes().into(), id)?;
        self.address_map = map.flush()?;

        Ok(Address::new_id(id))
    }

    /// Resolves an address to an ID address, if it has been mapped. ID addresses resolve to
    /// themselves without a lookup.
    pub fn resolve_address<BS: Ipld>(
        &self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<Option<Address>, HamtError> {
        if addr.id().is_ok() {
            return Ok(Some(*addr));
        }

        let map: Hamt<BS, ActorID> =
            Hamt::load_with_version(&self.address_map, store, version.into())?;
        Ok(map.get(&addr.to_bytes())?.copied().map(Address::new_id))
    }
}
