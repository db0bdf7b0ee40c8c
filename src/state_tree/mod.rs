// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Global map from ID address to actor record.
//!
//! Writes land in a stack of snapshot layers and only reach the actors HAMT on
//! [`StateTree::flush`]. The interpreter pushes a layer per invocation and drops it if the
//! invocation aborts.

use ahash::HashMap;
use cid::Cid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_tuple::{Deserialize_tuple, Serialize_tuple};
use thiserror::Error;
use tracing::trace;

use crate::actors::INIT_ACTOR_ADDR;
use crate::actors::builtin::{Map, init};
use crate::actors::universal::{LoadError, Universal, VersionedState as _};
use crate::db::{Ipld, IpldError, IpldExt as _};
use crate::ipld::hamt;
use crate::runtime::ActorError;
use crate::shim::address::{Address, Protocol};
use crate::shim::econ::TokenAmount;
use crate::shim::version::StateTreeVersion;
use crate::utils::cid::CidCborExt as _;
use crate::utils::encoding::from_slice;

/// State of all actor implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ActorState {
    /// Link to code for the actor.
    pub code: Cid,
    /// Link to the state of the actor.
    pub state: Cid,
    /// Sequence of the actor.
    pub sequence: u64,
    /// Tokens available to the actor.
    pub balance: TokenAmount,
}

impl ActorState {
    pub fn new(code: Cid, state: Cid, balance: TokenAmount, sequence: u64) -> Self {
        Self {
            code,
            state,
            sequence,
            balance,
        }
    }

    /// Safely deducts funds from an Actor
    pub fn deduct_funds(&mut self, amt: &TokenAmount) -> Result<(), Error> {
        if &self.balance < amt {
            return Err(Error::InsufficientFunds {
                balance: self.balance.clone(),
                amount: amt.clone(),
            });
        }
        self.balance -= amt.clone();
        Ok(())
    }

    /// Deposits funds to an Actor
    pub fn deposit_funds(&mut self, amt: &TokenAmount) {
        self.balance += amt.clone();
    }
}

/// Root of a versioned state tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct StateRoot {
    pub version: StateTreeVersion,
    /// HAMT of actors.
    pub actors: Cid,
    /// Link to the state tree info.
    pub info: Cid,
}

/// Empty state tree info, encoded as an empty array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateInfo0;

impl Serialize for StateInfo0 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        <[u8; 0]>::default().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StateInfo0 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <[u8; 0]>::deserialize(deserializer).map(|_| StateInfo0)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("actor {0} not found")]
    ActorNotFound(Address),
    #[error("address {0} could not be resolved to an ID")]
    Unresolved(Address),
    #[error("no snapshot layer to {0}")]
    NoSnapshot(&'static str),
    #[error("tried to flush state tree with {0} snapshots on the stack")]
    PendingSnapshots(usize),
    #[error("insufficient funds: balance {balance}, needed {amount}")]
    InsufficientFunds {
        balance: TokenAmount,
        amount: TokenAmount,
    },
    #[error(transparent)]
    Hamt(#[from] hamt::Error),
    #[error(transparent)]
    Ipld(#[from] IpldError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl From<Error> for ActorError {
    fn from(e: Error) -> Self {
        match e {
            Error::Hamt(e) => e.into(),
            Error::Ipld(e) => e.into(),
            Error::Load(e) => e.into(),
            Error::ActorNotFound(_) | Error::Unresolved(_) => Self::not_found(e.to_string()),
            Error::InsufficientFunds { .. } => Self::insufficient_funds(e.to_string()),
            e => Self::illegal_state(e.to_string()),
        }
    }
}

/// Pending actor writes; `None` marks a deletion.
#[derive(Debug, Default)]
struct SnapLayer {
    actors: HashMap<Address, Option<ActorState>>,
    resolve_cache: HashMap<Address, Address>,
}

/// State tree implementation using hamt. This structure is not threadsafe and should only be
/// used in sync contexts.
pub struct StateTree<S> {
    hamt: Map<S, ActorState>,
    version: StateTreeVersion,
    info: Option<Cid>,
    layers: Vec<SnapLayer>,
}

impl<S: Ipld> StateTree<S> {
    /// Creates an empty tree of `version`.
    pub fn new(store: S, version: StateTreeVersion) -> Result<Self, Error> {
        let info = match version {
            StateTreeVersion::V0 => None,
            _ => Some(store.put_cbor(&StateInfo0)?),
        };
        Ok(Self {
            hamt: Map::new_with_version(store, version.into()),
            version,
            info,
            layers: vec![SnapLayer::default()],
        })
    }

    /// Loads a tree from its root. A root that is not a [`StateRoot`] is taken to be the bare
    /// actors HAMT of a version 0 tree.
    pub fn new_from_root(store: S, root: &Cid) -> Result<Self, Error> {
        let bytes = store.get(root).map_err(IpldError::from)?;
        let (version, info, actors) = match from_slice::<StateRoot>(&bytes) {
            Ok(StateRoot {
                version,
                actors,
                info,
            }) => (version, Some(info), actors),
            Err(_) => (StateTreeVersion::V0, None, *root),
        };
        Ok(Self {
            hamt: Map::load_with_version(&actors, store, version.into())?,
            version,
            info,
            layers: vec![SnapLayer::default()],
        })
    }

    pub fn version(&self) -> StateTreeVersion {
        self.version
    }

    /// Retrieve store reference to modify db.
    pub fn store(&self) -> &S {
        self.hamt.store()
    }

    /// Get actor state from an address. Will be resolved to ID address.
    pub fn get_actor(&self, addr: &Address) -> Result<Option<ActorState>, Error> {
        let Some(addr) = self.lookup_id(addr)? else {
            return Ok(None);
        };
        if let Some(cached) = self.layers.iter().rev().find_map(|l| l.actors.get(&addr)) {
            return Ok(cached.clone());
        }
        Ok(self.hamt.get(&addr.to_bytes())?.cloned())
    }

    /// Set actor state for an address. Will set state at ID address.
    pub fn set_actor(&mut self, addr: &Address, actor: ActorState) -> Result<(), Error> {
        let addr = self.lookup_id(addr)?.ok_or(Error::Unresolved(*addr))?;
        self.top().actors.insert(addr, Some(actor));
        Ok(())
    }

    /// Delete actor for an address. Will resolve to ID address to delete.
    pub fn delete_actor(&mut self, addr: &Address) -> Result<(), Error> {
        let addr = self.lookup_id(addr)?.ok_or(Error::Unresolved(*addr))?;
        self.top().actors.insert(addr, None);
        Ok(())
    }

    /// Mutate and set actor state for an Address.
    pub fn mutate_actor<F>(&mut self, addr: &Address, mutate: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ActorState) -> Result<(), Error>,
    {
        let mut act = self.get_actor(addr)?.ok_or(Error::ActorNotFound(*addr))?;
        mutate(&mut act)?;
        self.set_actor(addr, act)
    }

    /// Get an ID address from any Address, consulting the Init actor's address map.
    pub fn lookup_id(&self, addr: &Address) -> Result<Option<Address>, Error> {
        if addr.protocol() == Protocol::ID {
            return Ok(Some(*addr));
        }
        if let Some(id) = self
            .layers
            .iter()
            .rev()
            .find_map(|l| l.resolve_cache.get(addr))
        {
            return Ok(Some(*id));
        }

        let init_act = self
            .get_actor(&INIT_ACTOR_ADDR)?
            .ok_or(Error::ActorNotFound(INIT_ACTOR_ADDR))?;
        let state = Universal::<init::State>::load_actor(self.store(), &init_act)?;
        Ok(state.resolve_address(self.store(), state.version(), addr)?)
    }

    /// Register a new address through the init actor.
    pub fn register_new_address(&mut self, addr: &Address) -> Result<Address, Error> {
        let mut actor = self
            .get_actor(&INIT_ACTOR_ADDR)?
            .ok_or(Error::ActorNotFound(INIT_ACTOR_ADDR))?;

        let state = Universal::<init::State>::load_actor(self.store(), &actor)?;
        let version = state.version();
        let mut state = state.into_inner();
        let new_addr = state.map_address_to_new_id(self.store(), version, addr)?;

        // Set state for init actor in store and update root Cid
        let bytes = state.encode().map_err(IpldError::from)?;
        actor.state = Cid::from_cbor_bytes(&bytes);
        self.store()
            .set(actor.state, bytes)
            .map_err(IpldError::from)?;
        self.set_actor(&INIT_ACTOR_ADDR, actor)?;
        self.top().resolve_cache.insert(*addr, new_addr);

        trace!(%addr, %new_addr, "registered address");
        Ok(new_addr)
    }

    /// Add snapshot layer to stack.
    pub fn snapshot(&mut self) {
        self.layers.push(SnapLayer::default());
    }

    /// Merges the last snapshot layer into the one below it.
    pub fn clear_snapshot(&mut self) -> Result<(), Error> {
        if self.layers.len() < 2 {
            return Err(Error::NoSnapshot("clear"));
        }
        let top = self.layers.pop().ok_or(Error::NoSnapshot("clear"))?;
        let below = self.top();
        below.actors.extend(top.actors);
        below.resolve_cache.extend(top.resolve_cache);
        Ok(())
    }

    /// Discards every write made since the last snapshot. The snapshot stays on the stack.
    pub fn revert_to_snapshot(&mut self) -> Result<(), Error> {
        if self.layers.len() < 2 {
            return Err(Error::NoSnapshot("revert"));
        }
        self.layers.pop();
        self.snapshot();
        Ok(())
    }

    /// Flush state tree and return Cid root.
    pub fn flush(&mut self) -> Result<Cid, Error> {
        if self.layers.len() != 1 {
            return Err(Error::PendingSnapshots(self.layers.len() - 1));
        }

        let base = std::mem::take(&mut self.layers[0]);
        for (addr, actor) in base.actors {
            match actor {
                None => {
                    self.hamt.delete(&addr.to_bytes())?;
                }
                Some(actor) => {
                    self.hamt.set(addr.to_bytes().into(), actor)?;
                }
            }
        }
        self.layers[0].resolve_cache = base.resolve_cache;

        let actors = self.hamt.flush()?;
        match self.info {
            None => Ok(actors),
            Some(info) => Ok(self.store().put_cbor(&StateRoot {
                version: self.version,
                actors,
                info,
            })?),
        }
    }

    fn top(&mut self) -> &mut SnapLayer {
        if self.layers.is_empty() {
            self.layers.push(SnapLayer::default());
        }
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }
}
