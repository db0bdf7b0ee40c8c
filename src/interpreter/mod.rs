// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Reference interpreter applying messages to a [`StateTree`] with the builtin actors.
//!
//! Every message runs inside a state tree snapshot. Nested sends take their own snapshot,
//! so an aborted call rolls back its own writes and those of everything it called while
//! leaving the caller's earlier writes intact.

mod context;
pub mod gas;

pub use self::context::InvocationContext;

use cid::Cid;
use thiserror::Error;
use tracing::{debug, instrument};

use self::gas::{GasTracker, PriceList};
use crate::actor_error;
use crate::actors::builtin::{account, cron, init, reward};
use crate::actors::policy::Policy;
use crate::actors::{
    ActorKind, BURNT_FUNDS_ACTOR_ADDR, CRON_ACTOR_ADDR, INIT_ACTOR_ADDR, REWARD_ACTOR_ADDR,
    STORAGE_MARKET_ACTOR_ADDR, STORAGE_POWER_ACTOR_ADDR, SYSTEM_ACTOR_ADDR,
    VERIFIED_REGISTRY_ACTOR_ADDR, builtin_code, is_account_actor,
};
use crate::config::Config;
use crate::db::{Ipld, IpldError, IpldExt as _};
use crate::invoker::Invoker;
use crate::runtime::{ActorError, METHOD_CONSTRUCTOR};
use crate::shim::MethodNum;
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::error::ExitCode;
use crate::shim::version::{ActorVersion, NetworkVersion, StateTreeVersion, VersionError};
use crate::state_tree::{self, ActorState, StateTree};
use crate::utils::cid::{EMPTY_ARR_BYTES, EMPTY_ARR_CID};
use crate::utils::encoding::{CodecError, RawBytes};

/// Gas limit of messages the system applies on its own behalf.
pub const IMPLICIT_MESSAGE_GAS_LIMIT: i64 = i64::MAX / 2;

/// Deepest chain of nested sends a message may produce.
pub const MAX_CALL_DEPTH: u32 = 4096;

/// Interpreter error. Actor aborts are reported through [`ApplyRet::exit_code`] instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    StateTree(#[from] state_tree::Error),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Ipld(#[from] IpldError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("no builtin {0} actor at {1}")]
    MissingCode(ActorKind, ActorVersion),
    #[error("genesis construction of the {kind} actor failed: {source}")]
    Genesis { kind: ActorKind, source: ActorError },
}

/// A message applied to the state tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: Address,
    pub to: Address,
    pub sequence: u64,
    pub value: TokenAmount,
    pub method_num: MethodNum,
    pub params: RawBytes,
    pub gas_limit: i64,
}

impl Message {
    /// Message from the system actor, as used for genesis and cron.
    pub fn implicit(to: Address, method_num: MethodNum, params: RawBytes) -> Self {
        Self {
            from: SYSTEM_ACTOR_ADDR,
            to,
            sequence: 0,
            value: TokenAmount::zero(),
            method_num,
            params,
            gas_limit: IMPLICIT_MESSAGE_GAS_LIMIT,
        }
    }
}

/// Receipt of an applied message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRet {
    pub exit_code: ExitCode,
    pub return_data: RawBytes,
    pub gas_used: i64,
    /// Abort message of a failed execution.
    pub failure_info: Option<String>,
}

impl ApplyRet {
    fn failed(err: &ActorError, gas_used: i64) -> Self {
        Self {
            exit_code: err.exit_code(),
            return_data: RawBytes::default(),
            gas_used,
            failure_info: Some(err.msg().to_owned()),
        }
    }
}

/// Interpreter which applies messages on top of a state tree and returns receipts.
pub struct Vm<S> {
    state: StateTree<S>,
    network_version: NetworkVersion,
    actor_version: ActorVersion,
    epoch: ChainEpoch,
    policy: Policy,
    prices: PriceList,
    invoker: &'static Invoker,

    // Per message, reset by `begin`.
    gas: GasTracker,
    origin: Address,
    origin_nonce: u64,
    num_actors_created: u64,
}

impl<S: Ipld> Vm<S> {
    /// Interpreter over an empty state tree.
    pub fn new(store: S, network_version: NetworkVersion, policy: Policy) -> Result<Self, Error> {
        let version = StateTreeVersion::try_from(network_version)?;
        let state = StateTree::new(store, version)?;
        Self::with_state(state, network_version, policy)
    }

    /// Interpreter over the state tree rooted at `root`.
    pub fn load(
        store: S,
        root: &Cid,
        network_version: NetworkVersion,
        policy: Policy,
    ) -> Result<Self, Error> {
        let state = StateTree::new_from_root(store, root)?;
        Self::with_state(state, network_version, policy)
    }

    fn with_state(
        state: StateTree<S>,
        network_version: NetworkVersion,
        policy: Policy,
    ) -> Result<Self, Error> {
        Ok(Self {
            state,
            network_version,
            actor_version: ActorVersion::try_from(network_version)?,
            epoch: 0,
            policy,
            prices: PriceList::default(),
            invoker: Invoker::builtin(),
            gas: GasTracker::new(0),
            origin: SYSTEM_ACTOR_ADDR,
            origin_nonce: 0,
            num_actors_created: 0,
        })
    }

    /// Builds a genesis state: every singleton actor is installed and constructed through
    /// its own constructor, and the burnt funds account is created.
    #[instrument(skip_all, fields(network = %config.network_name, nv = %config.network_version))]
    pub fn genesis(
        store: S,
        config: &Config,
        verified_registry_root: &Address,
    ) -> Result<Self, Error> {
        let mut vm = Self::new(store, config.network_version, config.policy.clone())?;
        vm.state
            .store()
            .set(*EMPTY_ARR_CID, EMPTY_ARR_BYTES.to_vec())
            .map_err(IpldError::from)?;

        let singletons = [
            (ActorKind::System, SYSTEM_ACTOR_ADDR, RawBytes::serialize(&())?),
            (
                ActorKind::Init,
                INIT_ACTOR_ADDR,
                RawBytes::serialize(&init::ConstructorParams {
                    network_name: config.network_name.clone(),
                })?,
            ),
            (
                ActorKind::Reward,
                REWARD_ACTOR_ADDR,
                RawBytes::serialize(&reward::ConstructorParams(None))?,
            ),
            (
                ActorKind::Cron,
                CRON_ACTOR_ADDR,
                RawBytes::serialize(&cron::ConstructorParams { entries: vec![] })?,
            ),
            (ActorKind::Power, STORAGE_POWER_ACTOR_ADDR, RawBytes::serialize(&())?),
            (ActorKind::Market, STORAGE_MARKET_ACTOR_ADDR, RawBytes::serialize(&())?),
            (
                ActorKind::VerifiedRegistry,
                VERIFIED_REGISTRY_ACTOR_ADDR,
                RawBytes::serialize(verified_registry_root)?,
            ),
        ];
        for (kind, addr, _) in &singletons {
            let code = vm.code(*kind)?;
            vm.state
                .set_actor(addr, ActorState::new(code, *EMPTY_ARR_CID, TokenAmount::zero(), 0))?;
        }

        let burnt = vm.state.store().put_cbor(&account::v0::State {
            address: BURNT_FUNDS_ACTOR_ADDR,
        })?;
        let code = vm.code(ActorKind::Account)?;
        vm.state.set_actor(
            &BURNT_FUNDS_ACTOR_ADDR,
            ActorState::new(code, burnt, TokenAmount::zero(), 0),
        )?;

        for (kind, addr, params) in singletons {
            let msg = Message::implicit(addr, METHOD_CONSTRUCTOR, params);
            let ret = vm.apply_implicit_message(&msg)?;
            if !ret.exit_code.is_success() {
                let msg = ret.failure_info.unwrap_or_default();
                return Err(Error::Genesis {
                    kind,
                    source: ActorError::unchecked(ret.exit_code, msg),
                });
            }
        }
        debug!("genesis state created");
        Ok(vm)
    }

    /// Code of `kind` at the interpreter's actor version.
    pub fn code(&self, kind: ActorKind) -> Result<Cid, Error> {
        builtin_code(kind, self.actor_version)
            .ok_or(Error::MissingCode(kind, self.actor_version))
    }

    pub fn state_tree(&self) -> &StateTree<S> {
        &self.state
    }

    pub fn state_tree_mut(&mut self) -> &mut StateTree<S> {
        &mut self.state
    }

    pub fn get_actor(&self, addr: &Address) -> Result<Option<ActorState>, Error> {
        Ok(self.state.get_actor(addr)?)
    }

    pub fn network_version(&self) -> NetworkVersion {
        self.network_version
    }

    pub fn actor_version(&self) -> ActorVersion {
        self.actor_version
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn epoch(&self) -> ChainEpoch {
        self.epoch
    }

    pub fn set_epoch(&mut self, epoch: ChainEpoch) {
        self.epoch = epoch;
    }

    /// Replaces the flat charges used for new messages.
    pub fn set_price_list(&mut self, prices: PriceList) {
        self.prices = prices;
    }

    /// Flush stores in VM and return state root.
    pub fn flush(&mut self) -> Result<Cid, Error> {
        Ok(self.state.flush()?)
    }

    /// Creates an account actor for the key address `key` holding `balance`, the way
    /// genesis allocates funds.
    pub fn create_account(
        &mut self,
        key: &Address,
        balance: TokenAmount,
    ) -> Result<Address, ActorError> {
        if let Some(id) = self.state.lookup_id(key)? {
            return Err(actor_error!(illegal_argument; "{} already has actor {}", key, id));
        }
        self.begin(SYSTEM_ACTOR_ADDR, 0, IMPLICIT_MESSAGE_GAS_LIMIT);
        let id = self.try_create_account_actor(key, 0)?;
        self.state.mutate_actor(&id, |actor| {
            actor.deposit_funds(&balance);
            Ok(())
        })?;
        Ok(id)
    }

    /// Applies a message sent by the system. No sequence check is made.
    #[instrument(skip_all, fields(to = %msg.to, method = msg.method_num))]
    pub fn apply_implicit_message(&mut self, msg: &Message) -> Result<ApplyRet, Error> {
        self.begin(msg.from, msg.sequence, msg.gas_limit);
        let Some(from) = self.state.lookup_id(&msg.from)? else {
            return Ok(self.sender_invalid(
                ExitCode::SysErrSenderInvalid,
                format!("sender {} not found", msg.from),
            ));
        };
        let res = self.call(from, &msg.to, msg.method_num, &msg.params, &msg.value, 0);
        Ok(self.finish(res))
    }

    /// Applies a message signed by an account. The sender's sequence must match the
    /// message and is incremented even if execution aborts.
    #[instrument(skip_all, fields(from = %msg.from, to = %msg.to, method = msg.method_num))]
    pub fn apply_message(&mut self, msg: &Message) -> Result<ApplyRet, Error> {
        self.begin(msg.from, msg.sequence, msg.gas_limit);
        let Some(sender) = self.state.get_actor(&msg.from)? else {
            return Ok(self.sender_invalid(
                ExitCode::SysErrSenderInvalid,
                format!("sender {} not found", msg.from),
            ));
        };
        if !is_account_actor(&sender.code) {
            return Ok(self.sender_invalid(
                ExitCode::SysErrSenderInvalid,
                format!("sender {} is not an account actor", msg.from),
            ));
        }
        if sender.sequence != msg.sequence {
            return Ok(self.sender_invalid(
                ExitCode::SysErrSenderStateInvalid,
                format!("actor sequence invalid: {} != {}", msg.sequence, sender.sequence),
            ));
        }
        self.state.mutate_actor(&msg.from, |actor| {
            actor.sequence += 1;
            Ok(())
        })?;
        let from = self
            .state
            .lookup_id(&msg.from)?
            .ok_or(state_tree::Error::Unresolved(msg.from))?;

        let res = self.call(from, &msg.to, msg.method_num, &msg.params, &msg.value, 0);
        Ok(self.finish(res))
    }

    fn begin(&mut self, origin: Address, origin_nonce: u64, gas_limit: i64) {
        self.gas = GasTracker::new(gas_limit);
        self.origin = origin;
        self.origin_nonce = origin_nonce;
        self.num_actors_created = 0;
    }

    fn sender_invalid(&self, code: ExitCode, msg: String) -> ApplyRet {
        debug!(exit_code = %code, msg, "message rejected");
        ApplyRet::failed(&ActorError::unchecked(code, msg), 0)
    }

    fn finish(&self, res: Result<RawBytes, ActorError>) -> ApplyRet {
        let gas_used = self.gas.gas_used();
        match res {
            Ok(return_data) => ApplyRet {
                exit_code: ExitCode::Ok,
                return_data,
                gas_used,
                failure_info: None,
            },
            Err(err) => {
                debug!(exit_code = %err.exit_code(), msg = err.msg(), "message execution failed");
                ApplyRet::failed(&err, gas_used)
            }
        }
    }
}

#[cfg(test)]
mod tests;
