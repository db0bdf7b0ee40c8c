// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde_tuple::{Deserialize_tuple, Serialize_tuple};
use tracing::warn;

use crate::actors::{ActorKind, SYSTEM_ACTOR_ADDR};
use crate::invoker::MethodTable;
use crate::runtime::{ActorError, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _};
use crate::shim::econ::TokenAmount;
use crate::shim::version::ActorVersion;
use crate::utils::encoding::{Cbor, RawBytes};
use crate::{method_table, versioned_state};

/// Cron actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    EpochTick = 2,
}

pub mod v0 {
    use super::*;
    use crate::shim::MethodNum;
    use crate::shim::address::Address;

    /// Cron actor state which holds entries to call during epoch tick
    #[derive(Default, Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
    pub struct State {
        /// Entries is a set of actors (and corresponding methods) to call during EpochTick.
        pub entries: Vec<Entry>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
    pub struct Entry {
        /// The actor to call (ID address)
        pub receiver: Address,
        /// The method number to call (must accept empty parameters)
        pub method_num: MethodNum,
    }
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::Cron {
        V0(v0::State) => [V0, V2, V3, V4, V5, V6, V7],
    }
}

impl State {
    pub fn entries(&self) -> &[v0::Entry] {
        match self {
            State::V0(st) => &st.entries,
        }
    }
}

/// Constructor parameters for Cron actor, contains entries
/// of actors and methods to call on each epoch
#[derive(Default, Debug, Serialize_tuple, Deserialize_tuple)]
pub struct ConstructorParams {
    pub entries: Vec<v0::Entry>,
}

impl Cbor for ConstructorParams {}

/// Cron actor
pub struct Actor;

impl Actor {
    /// Constructor for Cron actor
    pub fn constructor(rt: &mut dyn Runtime, params: ConstructorParams) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;
        rt.create(&v0::State {
            entries: params.entries,
        })
    }

    /// Executes built-in periodic actions, run at every Epoch.
    /// epoch_tick(r) is called after all other messages in the epoch have been applied.
    /// This can be seen as an implicit last message.
    pub fn epoch_tick(rt: &mut dyn Runtime, _: ()) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;

        let st: v0::State = rt.state()?;
        for entry in st.entries {
            // Failures of individual entries do not abort the tick
            if let Err(e) = rt.send(
                &entry.receiver,
                entry.method_num,
                RawBytes::default(),
                TokenAmount::zero(),
            ) {
                warn!(
                    receiver = %entry.receiver,
                    method = entry.method_num,
                    "cron entry failed: {e}"
                );
            }
        }
        Ok(())
    }
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    method_table!(ActorKind::Cron, version, Method {
        Constructor => Actor::constructor,
        EpochTick => Actor::epoch_tick,
    })
}
