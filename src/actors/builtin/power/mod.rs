// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod v0;
pub mod v2;
pub mod v3;

use num_bigint::BigInt;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::init::{self, ExecParams, ExecReturn};
use super::reward::FilterEstimate;
use super::{load_state, make_empty_map, make_map_with_root, miner, state_transaction};
use crate::actors::{ActorKind, INIT_ACTOR_ADDR, SYSTEM_ACTOR_ADDR, builtin_code};
use crate::db::Ipld;
use crate::invoker::MethodTable;
use crate::runtime::{
    ActorError, AsActorError as _, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _,
};
use crate::shim::StoragePower;
use crate::shim::address::Address;
use crate::shim::clock::EPOCHS_IN_YEAR;
use crate::shim::econ::TokenAmount;
use crate::shim::error::ExitCode;
use crate::shim::sector::{RegisteredPoStProof, RegisteredSealProof};
use crate::shim::version::ActorVersion;
use crate::utils::encoding::{BytesDe, Cbor, RawBytes, bigint_ser};
use crate::{actor_error, method_table, versioned_state};

/// Storage power actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    CreateMiner = 2,
    CurrentTotalPower = 9,
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::Power {
        V0(v0::State) => [V0],
        V2(v2::State) => [V2],
        V3(v3::State) => [V3, V4, V5, V6, V7],
    }
}

/// Power claimed by a miner, whatever layout it is stored with.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Claim {
    pub raw_byte_power: StoragePower,
    pub quality_adj_power: StoragePower,
}

impl State {
    pub fn miner_count(&self) -> i64 {
        match self {
            State::V0(st) => st.miner_count,
            State::V2(st) | State::V3(st) => st.miner_count,
        }
    }

    /// Network power and pledge as of the current epoch.
    pub fn total_power(&self) -> CurrentTotalPowerReturn {
        match self {
            State::V0(st) => CurrentTotalPowerReturn {
                raw_byte_power: st.this_epoch_raw_byte_power.clone(),
                quality_adj_power: st.this_epoch_quality_adj_power.clone(),
                pledge_collateral: st.this_epoch_pledge_collateral.clone(),
                quality_adj_power_smoothed: st.this_epoch_qa_power_smoothed.clone(),
            },
            State::V2(st) | State::V3(st) => CurrentTotalPowerReturn {
                raw_byte_power: st.this_epoch_raw_byte_power.clone(),
                quality_adj_power: st.this_epoch_quality_adj_power.clone(),
                pledge_collateral: st.this_epoch_pledge_collateral.clone(),
                quality_adj_power_smoothed: st.this_epoch_qa_power_smoothed.clone(),
            },
        }
    }

    /// First actor version writing this layout. Its maps use that version's encoding.
    fn layout_version(&self) -> ActorVersion {
        match self {
            State::V0(_) => ActorVersion::V0,
            State::V2(_) => ActorVersion::V2,
            State::V3(_) => ActorVersion::V3,
        }
    }

    /// Power claimed by `miner`, if it is registered.
    pub fn claim<BS: Ipld>(&self, store: BS, miner: &Address) -> Result<Option<Claim>, ActorError> {
        let key = miner.to_bytes();
        let version = self.layout_version();
        let claim = match self {
            State::V0(st) => make_map_with_root::<_, v0::Claim>(&st.claims, store, version)?
                .get(&key)?
                .map(|c| (c.raw_byte_power.clone(), c.quality_adj_power.clone())),
            State::V2(st) => make_map_with_root::<_, v2::Claim>(&st.claims, store, version)?
                .get(&key)?
                .map(|c| (c.raw_byte_power.clone(), c.quality_adj_power.clone())),
            State::V3(st) => make_map_with_root::<_, v3::Claim>(&st.claims, store, version)?
                .get(&key)?
                .map(|c| (c.raw_byte_power.clone(), c.quality_adj_power.clone())),
        };
        Ok(claim.map(|(raw_byte_power, quality_adj_power)| Claim {
            raw_byte_power,
            quality_adj_power,
        }))
    }

    /// Registers a new miner with an empty claim. Claims from actor version 2 on name the
    /// proof the miner was created with.
    pub fn add_miner<BS: Ipld>(
        &mut self,
        store: BS,
        miner: &Address,
        seal_proof_type: Option<RegisteredSealProof>,
        window_post_proof_type: RegisteredPoStProof,
    ) -> Result<(), ActorError> {
        let key = miner.to_bytes().into();
        let version = self.layout_version();
        match self {
            State::V0(st) => {
                let mut claims = make_map_with_root(&st.claims, store, version)?;
                claims.set(key, v0::Claim::default())?;
                st.claims = claims.flush()?;
                st.miner_count += 1;
            }
            State::V2(st) => {
                let seal_proof_type = seal_proof_type.ok_or_else(
                    || actor_error!(illegal_argument; "miner {} needs a seal proof type", miner),
                )?;
                let mut claims = make_map_with_root(&st.claims, store, version)?;
                let claim = v2::Claim {
                    seal_proof_type,
                    raw_byte_power: StoragePower::default(),
                    quality_adj_power: StoragePower::default(),
                };
                claims.set(key, claim)?;
                st.claims = claims.flush()?;
                st.miner_count += 1;
            }
            State::V3(st) => {
                let mut claims = make_map_with_root(&st.claims, store, version)?;
                let claim = v3::Claim {
                    window_post_proof_type,
                    raw_byte_power: StoragePower::default(),
                    quality_adj_power: StoragePower::default(),
                };
                claims.set(key, claim)?;
                st.claims = claims.flush()?;
                st.miner_count += 1;
            }
        }
        Ok(())
    }
}

/// Create miner parameters of miners that seal with a fixed proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct CreateMinerParamsV0 {
    pub owner: Address,
    pub worker: Address,
    pub seal_proof_type: RegisteredSealProof,
    #[serde(with = "serde_bytes")]
    pub peer: Vec<u8>,
    pub multiaddrs: Vec<BytesDe>,
}

impl Cbor for CreateMinerParamsV0 {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct CreateMinerParams {
    pub owner: Address,
    pub worker: Address,
    pub window_post_proof_type: RegisteredPoStProof,
    #[serde(with = "serde_bytes")]
    pub peer: Vec<u8>,
    pub multiaddrs: Vec<BytesDe>,
}

impl Cbor for CreateMinerParams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct CreateMinerReturn {
    /// Canonical ID-based address for the actor.
    pub id_address: Address,
    /// Re-org safe address for created actor.
    pub robust_address: Address,
}

impl Cbor for CreateMinerReturn {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct CurrentTotalPowerReturn {
    #[serde(with = "bigint_ser")]
    pub raw_byte_power: StoragePower,
    #[serde(with = "bigint_ser")]
    pub quality_adj_power: StoragePower,
    pub pledge_collateral: TokenAmount,
    pub quality_adj_power_smoothed: FilterEstimate,
}

impl Cbor for CurrentTotalPowerReturn {}

/// Initial QA power estimate, 750 PiB with a growth of 3.6 EiB per year.
fn initial_qa_power_estimate() -> FilterEstimate {
    FilterEstimate::new(
        BigInt::from(750_000u64) << 30u32,
        (BigInt::from(3_600_000u64) << 30u32) / EPOCHS_IN_YEAR,
    )
}

/// Storage Power Actor
pub struct Actor;

impl Actor {
    /// Constructor for StoragePower actor
    pub fn constructor(rt: &mut dyn Runtime, _: ()) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;
        let empty_map = make_empty_map::<_, ()>(rt.store())?;
        let smoothed = initial_qa_power_estimate();
        let st = match rt.actor_version() {
            ActorVersion::V0 => State::V0(v0::State::new(empty_map, smoothed)),
            ActorVersion::V2 => State::V2(v2::State::new(empty_map, smoothed)),
            _ => State::V3(v3::State::new(empty_map, smoothed)),
        };
        rt.create(&st)
    }

    pub fn create_miner_v0(
        rt: &mut dyn Runtime,
        params: CreateMinerParamsV0,
    ) -> Result<CreateMinerReturn, ActorError> {
        rt.validate_immediate_caller_type(&[ActorKind::Account, ActorKind::Multisig])?;
        let seal = params.seal_proof_type;
        let ctor = miner::ConstructorParamsV0 {
            owner: params.owner,
            worker: params.worker,
            control_addresses: Vec::new(),
            seal_proof_type: seal,
            peer_id: params.peer,
            multiaddrs: params.multiaddrs,
        };
        let ret = exec_miner(rt, RawBytes::serialize(&ctor)?)?;
        state_transaction(rt, |st: &mut State, rt| {
            st.add_miner(
                rt.store(),
                &ret.id_address,
                Some(seal),
                seal.registered_window_post_proof(),
            )
        })?;
        Ok(ret)
    }

    pub fn create_miner(
        rt: &mut dyn Runtime,
        params: CreateMinerParams,
    ) -> Result<CreateMinerReturn, ActorError> {
        rt.validate_immediate_caller_type(&[ActorKind::Account, ActorKind::Multisig])?;
        let post = params.window_post_proof_type;
        let ctor = miner::ConstructorParams {
            owner: params.owner,
            worker: params.worker,
            control_addresses: Vec::new(),
            window_post_proof_type: post,
            peer_id: params.peer,
            multiaddrs: params.multiaddrs,
        };
        let ret = exec_miner(rt, RawBytes::serialize(&ctor)?)?;
        state_transaction(rt, |st: &mut State, rt| {
            st.add_miner(rt.store(), &ret.id_address, None, post)
        })?;
        Ok(ret)
    }

    pub fn current_total_power(
        rt: &mut dyn Runtime,
        _: (),
    ) -> Result<CurrentTotalPowerReturn, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let st: State = load_state(&*rt)?;
        Ok(st.total_power())
    }
}

/// Asks the init actor to create a miner, forwarding the value received.
fn exec_miner(
    rt: &mut dyn Runtime,
    constructor_params: RawBytes,
) -> Result<CreateMinerReturn, ActorError> {
    let version = rt.actor_version();
    let code_cid = builtin_code(ActorKind::Miner, version)
        .with_context_code(ExitCode::ErrIllegalState, || {
            format!("no miner code for {version}")
        })?;
    let value = rt.message().value_received.clone();
    let ret: ExecReturn = rt.send_typed(
        &INIT_ACTOR_ADDR,
        init::Method::Exec as u64,
        &ExecParams {
            code_cid,
            constructor_params,
        },
        value,
    )?;
    Ok(CreateMinerReturn {
        id_address: ret.id_address,
        robust_address: ret.robust_address,
    })
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    match version {
        ActorVersion::V0 | ActorVersion::V2 => method_table!(ActorKind::Power, version, Method {
            Constructor => Actor::constructor,
            CreateMiner => Actor::create_miner_v0,
            CurrentTotalPower => Actor::current_total_power,
        }),
        _ => method_table!(ActorKind::Power, version, Method {
            Constructor => Actor::constructor,
            CreateMiner => Actor::create_miner,
            CurrentTotalPower => Actor::current_total_power,
        }),
    }
}
