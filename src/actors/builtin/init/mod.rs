// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod v0;

use cid::Cid;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::make_empty_map;
use crate::actors::{ActorKind, SYSTEM_ACTOR_ADDR, lookup_code};
use crate::db::Ipld;
use crate::invoker::MethodTable;
use crate::ipld::hamt::Error as HamtError;
use crate::runtime::{
    ActorContext as _, ActorError, AsActorError as _, METHOD_CONSTRUCTOR, Runtime,
    RuntimeExt as _,
};
use crate::shim::ActorID;
use crate::shim::address::Address;
use crate::shim::error::ExitCode;
use crate::shim::version::ActorVersion;
use crate::utils::encoding::{Cbor, RawBytes};
use crate::{actor_error, method_table, versioned_state};

/// Init actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    Exec = 2,
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::Init {
        V0(v0::State) => [V0, V2, V3, V4, V5, V6, V7],
    }
}

impl State {
    pub fn network_name(&self) -> &str {
        match self {
            State::V0(st) => &st.network_name,
        }
    }

    pub fn next_id(&self) -> ActorID {
        match self {
            State::V0(st) => st.next_id,
        }
    }

    pub fn resolve_address<BS: Ipld>(
        &self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<Option<Address>, HamtError> {
        match self {
            State::V0(st) => st.resolve_address(store, version, addr),
        }
    }

    pub fn map_address_to_new_id<BS: Ipld>(
        &mut self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<Address, HamtError> {
        match self {
            State::V0(st) => st.map_address_to_new_id(store, version, addr),
        }
    }
}

/// Init actor Constructor parameters
#[derive(Debug, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct ConstructorParams {
    pub network_name: String,
}

impl Cbor for ConstructorParams {}

/// Init actor Exec Params
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ExecParams {
    pub code_cid: Cid,
    pub constructor_params: RawBytes,
}

impl Cbor for ExecParams {}

/// Init actor Exec Return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ExecReturn {
    /// ID based address for created actor
    pub id_address: Address,
    /// Reorg safe address for actor
    pub robust_address: Address,
}

impl Cbor for ExecReturn {}

/// Init actor
pub struct Actor;

impl Actor {
    /// Init actor constructor
    pub fn constructor(rt: &mut dyn Runtime, params: ConstructorParams) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;
        let root = make_empty_map::<_, ActorID>(rt.store())?;
        rt.create(&v0::State::new(root, params.network_name))
    }

    /// Exec init actor
    pub fn exec(rt: &mut dyn Runtime, params: ExecParams) -> Result<ExecReturn, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let caller = rt.message().caller;
        let caller_code = rt
            .get_actor_code_cid(&caller)?
            .with_context_code(ExitCode::ErrIllegalState, || {
                format!("no code for caller at {caller}")
            })?;
        if !can_exec(&caller_code, &params.code_cid) {
            return Err(actor_error!(forbidden;
                "called type {} cannot exec actor type {}",
                caller_code, params.code_cid
            ));
        }

        // Compute a re-org-stable address.
        // This address exists for use by messages coming from outside the system, in order to
        // stably address the newly created actor even if a chain re-org causes it to end up with
        // a different ID.
        let robust_address = rt.new_actor_address()?;

        // Allocate an ID for this actor.
        // Store mapping of pubkey or actor address to actor ID
        let id_address = rt.transaction(|st: &mut v0::State, rt| {
            st.map_address_to_new_id(rt.store(), rt.actor_version(), &robust_address)
                .context_code(ExitCode::ErrIllegalState, "failed to allocate ID address")
        })?;

        // Create an empty actor
        rt.create_actor(params.code_cid, &id_address)?;

        // Invoke constructor
        let value = rt.message().value_received.clone();
        rt.send(
            &id_address,
            METHOD_CONSTRUCTOR,
            params.constructor_params,
            value,
        )
        .context("constructor failed")?;

        Ok(ExecReturn {
            id_address,
            robust_address,
        })
    }
}

/// Only the power actor may create miners. Multisigs and payment channels may be created
/// by anyone.
fn can_exec(caller: &Cid, exec: &Cid) -> bool {
    match (lookup_code(caller), lookup_code(exec)) {
        (Ok((ActorKind::Power, _)), Ok((ActorKind::Miner, _))) => true,
        (_, Ok((ActorKind::Multisig | ActorKind::PaymentChannel, _))) => true,
        _ => false,
    }
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    method_table!(ActorKind::Init, version, Method {
        Constructor => Actor::constructor,
        Exec => Actor::exec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::builtin::testing::MockRuntime;
    use crate::actors::{INIT_ACTOR_ADDR, STORAGE_POWER_ACTOR_ADDR, builtin_code};
    use crate::db::MemoryDB;
    use crate::ipld::hamt::Hamt;
    use crate::shim::econ::TokenAmount;
    use pretty_assertions::assert_eq;

    fn construct() -> MockRuntime {
        let mut rt = MockRuntime::new(ActorKind::Init, INIT_ACTOR_ADDR);
        rt.set_caller(ActorKind::System, SYSTEM_ACTOR_ADDR);
        rt.expect_validate_caller_addr(&[SYSTEM_ACTOR_ADDR]);
        rt.call(
            Method::Constructor as u64,
            &ConstructorParams {
                network_name: "mock".into(),
            },
        )
        .unwrap();
        rt.verify();
        rt
    }

    fn exec(rt: &mut MockRuntime, code: Cid, params: RawBytes) -> Result<ExecReturn, ActorError> {
        rt.expect_validate_caller_any();
        let ret = rt.call(
            Method::Exec as u64,
            &ExecParams {
                code_cid: code,
                constructor_params: params,
            },
        )?;
        Ok(ret.deserialize().unwrap())
    }

    #[test]
    fn construct_is_empty() {
        let rt = construct();
        let st: v0::State = rt.get_state();
        assert_eq!(st.next_id, 100);
        assert_eq!(st.network_name, "mock");
        assert_eq!(
            st.resolve_address(&rt.store, rt.version, &Address::new_actor(b"nope"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn exec_multisig_from_account() {
        let mut rt = construct();
        rt.set_caller(ActorKind::Account, Address::new_id(1000));
        rt.set_value(TokenAmount::from_atto(100));

        let robust = Address::new_actor(b"msig");
        let msig_code = builtin_code(ActorKind::Multisig, rt.version).unwrap();
        let ctor_params = RawBytes::new(vec![0x80]);
        rt.new_actor_addr = Some(robust);
        rt.expect_create_actor(msig_code, Address::new_id(100));
        rt.expect_send(
            Address::new_id(100),
            METHOD_CONSTRUCTOR,
            ctor_params.clone(),
            TokenAmount::from_atto(100),
            RawBytes::default(),
            ExitCode::Ok,
        );

        let ret = exec(&mut rt, msig_code, ctor_params).unwrap();
        rt.verify();
        assert_eq!(
            ret,
            ExecReturn {
                id_address: Address::new_id(100),
                robust_address: robust,
            }
        );

        let st: v0::State = rt.get_state();
        assert_eq!(st.next_id, 101);
        assert_eq!(
            st.resolve_address(&rt.store, rt.version, &robust).unwrap(),
            Some(Address::new_id(100))
        );
    }

    #[test]
    fn only_power_creates_miners() {
        let mut rt = construct();
        let miner_code = builtin_code(ActorKind::Miner, rt.version).unwrap();

        rt.set_caller(ActorKind::Account, Address::new_id(1000));
        let err = exec(&mut rt, miner_code, RawBytes::default()).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrForbidden);

        rt.set_caller(ActorKind::Power, STORAGE_POWER_ACTOR_ADDR);
        rt.new_actor_addr = Some(Address::new_actor(b"miner"));
        rt.expect_create_actor(miner_code, Address::new_id(100));
        rt.expect_send(
            Address::new_id(100),
            METHOD_CONSTRUCTOR,
            RawBytes::default(),
            TokenAmount::zero(),
            RawBytes::default(),
            ExitCode::Ok,
        );
        let ret = exec(&mut rt, miner_code, RawBytes::default()).unwrap();
        rt.verify();
        assert_eq!(ret.id_address, Address::new_id(100));
    }

    #[test]
    fn failed_constructor_aborts_exec() {
        let mut rt = construct();
        rt.set_caller(ActorKind::Account, Address::new_id(1000));
        let paych_code = builtin_code(ActorKind::PaymentChannel, rt.version).unwrap();
        rt.new_actor_addr = Some(Address::new_actor(b"paych"));
        rt.expect_create_actor(paych_code, Address::new_id(100));
        rt.expect_send(
            Address::new_id(100),
            METHOD_CONSTRUCTOR,
            RawBytes::default(),
            TokenAmount::zero(),
            RawBytes::default(),
            ExitCode::ErrIllegalArgument,
        );
        let err = exec(&mut rt, paych_code, RawBytes::default()).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
        assert!(err.msg().starts_with("constructor failed"));
    }

    #[test]
    fn account_code_is_not_execable() {
        let mut rt = construct();
        rt.set_caller(ActorKind::Account, Address::new_id(1000));
        let code = builtin_code(ActorKind::Account, rt.version).unwrap();
        let err = exec(&mut rt, code, RawBytes::default()).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrForbidden);
    }

    #[test]
    fn id_addresses_resolve_to_themselves() {
        let store = MemoryDB::default();
        let root = make_empty_map::<_, ActorID>(&store).unwrap();
        let st = v0::State::new(root, "x".into());
        assert_eq!(
            st.resolve_address(&store, ActorVersion::V7, &Address::new_id(7))
                .unwrap(),
            Some(Address::new_id(7))
        );
    }

    #[test]
    fn address_map_encoding_follows_actor_version() {
        let store = MemoryDB::default();
        let root = make_empty_map::<_, ActorID>(&store).unwrap();
        let robust = Address::new_actor(b"legacy");

        let mut st = v0::State::new(root, "x".into());
        let id = st
            .map_address_to_new_id(&store, ActorVersion::V2, &robust)
            .unwrap();
        assert_eq!(
            st.resolve_address(&store, ActorVersion::V0, &robust).unwrap(),
            Some(id)
        );
        assert!(Hamt::<_, ActorID>::load(&st.address_map, &store).is_err());
        assert!(st.resolve_address(&store, ActorVersion::V3, &robust).is_err());

        let mut current = v0::State::new(root, "x".into());
        current
            .map_address_to_new_id(&store, ActorVersion::V3, &robust)
            .unwrap();
        assert_ne!(current.address_map, st.address_map);
        assert!(Hamt::<_, ActorID>::load(&current.address_map, &store).is_ok());
    }
}
