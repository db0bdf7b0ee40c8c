// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod account;
pub mod cron;
pub mod init;
pub mod market;
pub mod miner;
pub mod multisig;
pub mod paych;
pub mod power;
pub mod reward;
pub mod system;
pub mod verifreg;

use cid::Cid;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ActorKind;
use super::universal::VersionedState;
use crate::db::Ipld;
use crate::invoker::MethodTable;
use crate::ipld::hamt::Hamt;
use crate::runtime::{ActorError, AsActorError, Runtime};
use crate::shim::address::Address;
use crate::shim::error::ExitCode;
use crate::shim::version::ActorVersion;
use crate::utils::cid::CidCborExt as _;

/// Map type used for actor state tables keyed by bytes.
pub type Map<BS, V> = Hamt<BS, V>;

/// Method table of `kind` at `version`.
pub fn method_table(kind: ActorKind, version: ActorVersion) -> MethodTable {
    match kind {
        ActorKind::System => system::method_table(version),
        ActorKind::Init => init::method_table(version),
        ActorKind::Cron => cron::method_table(version),
        ActorKind::Account => account::method_table(version),
        ActorKind::Power => power::method_table(version),
        ActorKind::Miner => miner::method_table(version),
        ActorKind::Market => market::method_table(version),
        ActorKind::PaymentChannel => paych::method_table(version),
        ActorKind::Multisig => multisig::method_table(version),
        ActorKind::Reward => reward::method_table(version),
        ActorKind::VerifiedRegistry => verifreg::method_table(version),
    }
}

/// Flushes an empty map and returns its root. Empty roots are the same in every map encoding.
pub fn make_empty_map<BS: Ipld, V>(store: BS) -> Result<Cid, ActorError>
where
    V: Serialize + DeserializeOwned,
{
    Map::<BS, V>::new(store)
        .flush()
        .context_code(ExitCode::ErrIllegalState, "failed to create empty map")
}

/// Loads the map rooted at `root`, written in the map encoding of actors `version`.
pub fn make_map_with_root<BS: Ipld, V>(
    root: &Cid,
    store: BS,
    version: ActorVersion,
) -> Result<Map<BS, V>, ActorError>
where
    V: Serialize + DeserializeOwned,
{
    Map::load_with_version(root, store, version.into())
        .with_context_code(ExitCode::ErrIllegalState, || format!("failed to load map {root}"))
}

/// Loads the receiver's state with the layout of the executing actor version.
pub fn load_state<S: VersionedState>(rt: &dyn Runtime) -> Result<S, ActorError> {
    let root = rt.state_root()?;
    let bytes = rt.store().get(&root)?;
    S::decode(rt.actor_version(), &bytes)
        .context_code(ExitCode::ErrIllegalState, "failed to decode actor state")
}

/// Versioned counterpart of [`crate::runtime::RuntimeExt::transaction`].
pub fn state_transaction<S, R, F>(rt: &mut dyn Runtime, f: F) -> Result<R, ActorError>
where
    S: VersionedState,
    F: FnOnce(&mut S, &dyn Runtime) -> Result<R, ActorError>,
{
    let mut st: S = load_state(&*rt)?;
    let ret = f(&mut st, &*rt)?;
    let bytes = st.encode()?;
    let root = Cid::from_cbor_bytes(&bytes);
    rt.store().set(root, bytes)?;
    rt.set_state_root(&root)?;
    Ok(ret)
}

/// Resolves `addr` to an ID address whose actor has code of `kind`.
pub fn resolve_to_kind(
    rt: &dyn Runtime,
    addr: &Address,
    kind: ActorKind,
) -> Result<Address, ActorError> {
    let id = rt
        .resolve_address(addr)?
        .with_context_code(ExitCode::ErrIllegalArgument, || {
            format!("failed to resolve address {addr}")
        })?;
    let code = rt
        .get_actor_code_cid(&id)?
        .with_context_code(ExitCode::ErrIllegalArgument, || {
            format!("no code for address {id}")
        })?;
    match super::lookup_code(&code) {
        Ok((found, _)) if found == kind => Ok(id),
        _ => Err(ActorError::illegal_argument(format!(
            "actor {addr} must be a {kind} actor"
        ))),
    }
}

#[cfg(test)]
pub(crate) mod testing;
