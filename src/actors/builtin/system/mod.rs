// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::actors::{ActorKind, SYSTEM_ACTOR_ADDR};
use crate::invoker::MethodTable;
use crate::runtime::{ActorError, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _};
use crate::shim::version::ActorVersion;
use crate::{method_table, versioned_state};

/// System actor methods.
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
}

pub mod v0 {
    use super::*;

    /// System actor state, an empty tuple.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct State;

    impl Serialize for State {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            <[u8; 0]>::default().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for State {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let []: [u8; 0] = Deserialize::deserialize(deserializer)?;
            Ok(State)
        }
    }
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::System {
        V0(v0::State) => [V0, V2, V3, V4, V5, V6, V7],
    }
}

/// System actor.
pub struct Actor;

impl Actor {
    /// System actor constructor.
    pub fn constructor(rt: &mut dyn Runtime, _: ()) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;
        rt.create(&v0::State)
    }
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    method_table!(ActorKind::System, version, Method {
        Constructor => Actor::constructor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::builtin::testing::MockRuntime;
    use crate::shim::address::Address;
    use crate::shim::error::ExitCode;
    use crate::utils::encoding::to_vec;

    #[test]
    fn state_is_empty_tuple() {
        assert_eq!(to_vec(&v0::State).unwrap(), vec![0x80]);
    }

    #[test]
    fn construct() {
        let mut rt = MockRuntime::new(ActorKind::System, SYSTEM_ACTOR_ADDR);
        rt.set_caller(ActorKind::System, SYSTEM_ACTOR_ADDR);
        rt.expect_validate_caller_addr(&[SYSTEM_ACTOR_ADDR]);
        rt.call(Method::Constructor as u64, &()).unwrap();
        rt.verify();
        let _: v0::State = rt.get_state();
    }

    #[test]
    fn rejects_parameters() {
        let mut rt = MockRuntime::new(ActorKind::System, SYSTEM_ACTOR_ADDR);
        rt.set_caller(ActorKind::System, SYSTEM_ACTOR_ADDR);
        let err = rt
            .call(Method::Constructor as u64, &Address::new_id(1))
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    }
}
