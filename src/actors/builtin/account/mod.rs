// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod v0;

use crate::actors::{ActorKind, SYSTEM_ACTOR_ADDR};
use crate::invoker::MethodTable;
use crate::runtime::{ActorError, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _};
use crate::shim::address::Address;
use crate::shim::version::ActorVersion;
use crate::{actor_error, method_table, versioned_state};

/// Account actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    PubkeyAddress = 2,
}

versioned_state! {
    /// Account actor state.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::Account {
        V0(v0::State) => [V0, V2, V3, V4, V5, V6, V7],
    }
}

impl State {
    /// Key address the account was created for.
    pub fn pubkey_address(&self) -> Address {
        match self {
            State::V0(st) => st.address,
        }
    }
}

/// Account Actor
pub struct Actor;

impl Actor {
    /// Constructor for Account actor
    pub fn constructor(rt: &mut dyn Runtime, address: Address) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;
        if !address.is_key_address() {
            return Err(actor_error!(illegal_argument;
                "address must use BLS or SECP protocol, got {}", address.protocol()));
        }
        rt.create(&v0::State { address })
    }

    /// Fetches the pubkey-type address from this actor.
    pub fn pubkey_address(rt: &mut dyn Runtime, _: ()) -> Result<Address, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let st: v0::State = rt.state()?;
        Ok(st.address)
    }
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    method_table!(ActorKind::Account, version, Method {
        Constructor => Actor::constructor,
        PubkeyAddress => Actor::pubkey_address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::builtin::testing::MockRuntime;
    use crate::actors::universal::Universal;
    use crate::db::{IpldExt as _, MemoryDB};
    use crate::shim::error::ExitCode;
    use crate::shim::version::NetworkVersion;
    use crate::utils::encoding::{from_slice, to_vec};
    use pretty_assertions::assert_eq;

    #[test]
    fn state_encoding() {
        let st = v0::State {
            address: Address::new_id(3),
        };
        let bytes = to_vec(&st).unwrap();
        assert_eq!(hex::encode(&bytes), "81420003");
        let decoded: v0::State = from_slice(&bytes).unwrap();
        assert_eq!(decoded.address.id().unwrap(), 3);
    }

    #[test]
    fn every_version_shares_the_layout() {
        let store = MemoryDB::default();
        let head = store
            .put_cbor(&v0::State {
                address: Address::new_id(3),
            })
            .unwrap();
        let old = Universal::<State>::load(NetworkVersion::V0, &head, &store).unwrap();
        let new = Universal::<State>::load(NetworkVersion::V15, &head, &store).unwrap();
        assert_eq!(old.to_cbor().unwrap(), new.to_cbor().unwrap());
        assert_eq!(new.pubkey_address(), Address::new_id(3));
    }

    #[test]
    fn construct_and_query() {
        let key = Address::new_secp256k1(&[4; 65]).unwrap();
        let mut rt = MockRuntime::new(ActorKind::Account, Address::new_id(100));
        rt.set_caller(ActorKind::System, SYSTEM_ACTOR_ADDR);
        rt.expect_validate_caller_addr(&[SYSTEM_ACTOR_ADDR]);
        rt.call(Method::Constructor as u64, &key).unwrap();
        rt.verify();

        rt.expect_validate_caller_any();
        let ret = rt.call(Method::PubkeyAddress as u64, &()).unwrap();
        assert_eq!(ret.deserialize::<Address>().unwrap(), key);
        rt.verify();
    }

    #[test]
    fn rejects_id_address() {
        let mut rt = MockRuntime::new(ActorKind::Account, Address::new_id(100));
        rt.set_caller(ActorKind::System, SYSTEM_ACTOR_ADDR);
        rt.expect_validate_caller_addr(&[SYSTEM_ACTOR_ADDR]);
        let err = rt
            .call(Method::Constructor as u64, &Address::new_id(1))
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    }
}
