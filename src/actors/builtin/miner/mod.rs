// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod types;
pub mod v0;
pub mod v2;
pub mod v3;

pub use self::types::*;

use cid::Cid;

use super::{ActorKind, load_state, make_empty_map, resolve_to_kind, state_transaction};
use crate::actors::{INIT_ACTOR_ADDR, is_principal};
use crate::db::{Ipld, IpldExt as _};
use crate::invoker::MethodTable;
use crate::runtime::{ActorError, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _};
use crate::shim::address::Address;
use crate::shim::econ::TokenAmount;
use crate::shim::version::ActorVersion;
use crate::utils::bitfield::BitField;
use crate::utils::cid::{EMPTY_ARR_BYTES, EMPTY_ARR_CID};
use crate::utils::encoding::BytesDe;
use crate::{actor_error, method_table, versioned_state};

/// Storage Miner actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    ControlAddresses = 2,
    ChangePeerID = 4,
    ChangeMultiaddrs = 18,
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::Miner {
        V0(v0::State) => [V0],
        V2(v2::State) => [V2],
        V3(v3::State) => [V3, V4, V5, V6, V7],
    }
}

impl State {
    pub fn info_cid(&self) -> Cid {
        match self {
            State::V0(st) => st.info,
            State::V2(st) | State::V3(st) => st.info,
        }
    }

    /// Loads the miner info. Layouts that record a seal proof derive the window PoSt proof
    /// from it.
    pub fn info<BS: Ipld + ?Sized>(&self, store: &BS) -> Result<MinerInfo, ActorError> {
        let cid = self.info_cid();
        Ok(match self {
            State::V0(_) => store.get_cbor::<v0::MinerInfo>(&cid)?.into(),
            State::V2(_) => store.get_cbor::<v2::MinerInfo>(&cid)?.into(),
            State::V3(_) => store.get_cbor::<v3::MinerInfo>(&cid)?.into(),
        })
    }

    /// Stores `info` with the layout of this state and links it.
    pub fn save_info<BS: Ipld + ?Sized>(
        &mut self,
        store: &BS,
        info: MinerInfo,
    ) -> Result<(), ActorError> {
        match self {
            State::V0(st) => st.info = store.put_cbor(&v0::MinerInfo::try_from(info)?)?,
            State::V2(st) => st.info = store.put_cbor(&v2::MinerInfo::try_from(info)?)?,
            State::V3(st) => st.info = store.put_cbor(&v3::MinerInfo::from(info))?,
        }
        Ok(())
    }

    pub fn allocated_sectors<BS: Ipld + ?Sized>(&self, store: &BS) -> Result<BitField, ActorError> {
        let cid = match self {
            State::V0(st) => st.allocated_sectors,
            State::V2(st) | State::V3(st) => st.allocated_sectors,
        };
        Ok(store.get_cbor(&cid)?)
    }

    pub fn locked_funds(&self) -> &TokenAmount {
        match self {
            State::V0(st) => &st.locked_funds,
            State::V2(st) | State::V3(st) => &st.locked_funds,
        }
    }
}

/// Miner Actor
pub struct Actor;

impl Actor {
    /// Constructor for miners created before actor version 3, which seal with a fixed proof.
    pub fn constructor_v0(
        rt: &mut dyn Runtime,
        params: ConstructorParamsV0,
    ) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[INIT_ACTOR_ADDR])?;
        let seal = params.seal_proof_type;
        if !rt.policy().is_supported_seal_proof(seal) {
            return Err(actor_error!(
                illegal_argument,
                "proof type {:?} not allowed for new miner actors",
                seal
            ));
        }
        let post = seal.registered_window_post_proof();
        let info = build_info(
            rt,
            MinerInfo {
                owner: params.owner,
                worker: params.worker,
                control_addresses: params.control_addresses,
                pending_worker_key: None,
                peer_id: params.peer_id,
                multiaddrs: params.multiaddrs,
                seal_proof_type: Some(seal),
                window_post_proof_type: post,
                sector_size: seal.sector_size(),
                window_post_partition_sectors: seal.window_post_partition_sectors(),
                consensus_fault_elapsed: EPOCH_UNDEFINED,
                pending_owner_address: None,
            },
        )?;
        construct(rt, info)
    }

    pub fn constructor(rt: &mut dyn Runtime, params: ConstructorParams) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[INIT_ACTOR_ADDR])?;
        let post = params.window_post_proof_type;
        if !rt.policy().is_supported_window_post_proof(post) {
            return Err(actor_error!(
                illegal_argument,
                "proof type {:?} not allowed for new miner actors",
                post
            ));
        }
        let info = build_info(
            rt,
            MinerInfo {
                owner: params.owner,
                worker: params.worker,
                control_addresses: params.control_addresses,
                pending_worker_key: None,
                peer_id: params.peer_id,
                multiaddrs: params.multiaddrs,
                seal_proof_type: None,
                window_post_proof_type: post,
                sector_size: post.sector_size(),
                window_post_partition_sectors: post.window_post_partition_sectors(),
                consensus_fault_elapsed: EPOCH_UNDEFINED,
                pending_owner_address: None,
            },
        )?;
        construct(rt, info)
    }

    /// Returns the owner, worker and control addresses of the miner.
    pub fn control_addresses(
        rt: &mut dyn Runtime,
        _: (),
    ) -> Result<GetControlAddressesReturn, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let st: State = load_state(&*rt)?;
        let info = st.info(rt.store())?;
        Ok(GetControlAddressesReturn {
            owner: info.owner,
            worker: info.worker,
            control_addresses: info.control_addresses,
        })
    }

    pub fn change_peer_id(
        rt: &mut dyn Runtime,
        params: ChangePeerIDParams,
    ) -> Result<(), ActorError> {
        check_peer_info(rt, &params.new_id, &[])?;
        validate_controlling_caller(rt)?;
        state_transaction(rt, |st: &mut State, rt| {
            let mut info = st.info(rt.store())?;
            info.peer_id = params.new_id;
            st.save_info(rt.store(), info)
        })
    }

    pub fn change_multiaddrs(
        rt: &mut dyn Runtime,
        params: ChangeMultiaddrsParams,
    ) -> Result<(), ActorError> {
        check_peer_info(rt, &[], &params.new_multi_addrs)?;
        validate_controlling_caller(rt)?;
        state_transaction(rt, |st: &mut State, rt| {
            let mut info = st.info(rt.store())?;
            info.multiaddrs = params.new_multi_addrs;
            st.save_info(rt.store(), info)
        })
    }
}

/// Checks the parameters every miner constructor shares and resolves the addresses.
fn build_info(rt: &dyn Runtime, mut info: MinerInfo) -> Result<MinerInfo, ActorError> {
    let max_control = rt.policy().max_control_addresses;
    if info.control_addresses.len() > max_control {
        return Err(actor_error!(
            illegal_argument,
            "control addresses length {} exceeds max control addresses length {}",
            info.control_addresses.len(),
            max_control
        ));
    }
    check_peer_info(rt, &info.peer_id, &info.multiaddrs)?;

    info.owner = resolve_control_address(rt, &info.owner)?;
    info.worker = resolve_to_kind(rt, &info.worker, ActorKind::Account)?;
    info.control_addresses = info
        .control_addresses
        .iter()
        .map(|addr| resolve_control_address(rt, addr))
        .collect::<Result<_, _>>()?;
    Ok(info)
}

fn construct(rt: &mut dyn Runtime, info: MinerInfo) -> Result<(), ActorError> {
    let store = rt.store();
    let empty_map = make_empty_map::<_, Cid>(store)?;
    store.set(*EMPTY_ARR_CID, EMPTY_ARR_BYTES.to_vec())?;
    let allocated_sectors = store.put_cbor(&BitField::new())?;
    let empty_array = *EMPTY_ARR_CID;

    // the info link is filled in by save_info

    let mut st = match rt.actor_version() {
        ActorVersion::V0 => State::V0(v0::State::new(
            empty_array,
            empty_map,
            empty_array,
            allocated_sectors,
        )),
        ActorVersion::V2 => State::V2(v2::State::new(
            empty_array,
            empty_map,
            empty_array,
            allocated_sectors,
        )),
        _ => State::V3(v3::State::new(
            empty_array,
            empty_map,
            empty_array,
            allocated_sectors,
        )),
    };
    st.save_info(rt.store(), info)?;
    rt.create(&st)
}

/// Owners and control addresses must be principals, resolved to ID addresses.
fn resolve_control_address(rt: &dyn Runtime, addr: &Address) -> Result<Address, ActorError> {
    let id = rt.resolve_id(addr)?;
    let code = rt
        .get_actor_code_cid(&id)?
        .ok_or_else(|| actor_error!(illegal_argument; "no code for address {}", id))?;
    if !is_principal(&code) {
        return Err(actor_error!(
            illegal_argument,
            "owner actor type must be a principal, was {}",
            code
        ));
    }
    Ok(id)
}

fn validate_controlling_caller(rt: &mut dyn Runtime) -> Result<(), ActorError> {
    let st: State = load_state(&*rt)?;
    let info = st.info(rt.store())?;
    rt.validate_immediate_caller_is(&info.controlling_addresses())
}

fn check_peer_info(
    rt: &dyn Runtime,
    peer_id: &[u8],
    multiaddrs: &[BytesDe],
) -> Result<(), ActorError> {
    let policy = rt.policy();
    if peer_id.len() > policy.max_peer_id_length {
        return Err(actor_error!(
            illegal_argument,
            "peer ID size of {} exceeds maximum size of {}",
            peer_id.len(),
            policy.max_peer_id_length
        ));
    }

    let mut total_size = 0;
    for ma in multiaddrs {
        if ma.0.is_empty() {
            return Err(actor_error!(illegal_argument; "invalid empty multiaddr"));
        }
        total_size += ma.0.len();
    }
    if total_size > policy.max_multiaddr_data {
        return Err(actor_error!(
            illegal_argument,
            "multiaddr size exceeds maximum of {}",
            policy.max_multiaddr_data
        ));
    }
    Ok(())
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    match version {
        ActorVersion::V0 | ActorVersion::V2 => method_table!(ActorKind::Miner, version, Method {
            Constructor => Actor::constructor_v0,
            ControlAddresses => Actor::control_addresses,
            ChangePeerID => Actor::change_peer_id,
            ChangeMultiaddrs => Actor::change_multiaddrs,
        }),
        _ => method_table!(ActorKind::Miner, version, Method {
            Constructor => Actor::constructor,
            ControlAddresses => Actor::control_addresses,
            ChangePeerID => Actor::change_peer_id,
            ChangeMultiaddrs => Actor::change_multiaddrs,
        }),
    }
}
