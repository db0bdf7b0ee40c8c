// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The boundary between actor method bodies and the system executing them.
//!
//! [`Runtime`] is object safe so method tables can hold plain function pointers taking
//! `&mut dyn Runtime`. Typed state access lives in [`RuntimeExt`], which is implemented for
//! every runtime including trait objects.

mod actor_error;

pub use self::actor_error::{ActorContext, ActorError, AsActorError};

use cid::Cid;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::actor_error;
use crate::actors::ActorKind;
use crate::actors::policy::Policy;
use crate::db::{Ipld, IpldExt as _};
use crate::shim::MethodNum;
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::error::ExitCode;
use crate::shim::version::{ActorVersion, NetworkVersion};
use crate::utils::cid::EMPTY_ARR_CID;
use crate::utils::encoding::RawBytes;

/// Method number of a plain value transfer.
pub const METHOD_SEND: MethodNum = 0;
/// Method number of every actor constructor.
pub const METHOD_CONSTRUCTOR: MethodNum = 1;

/// Information about the message that triggered the current invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    /// ID address of the immediate caller.
    pub caller: Address,
    /// ID address of the actor being invoked.
    pub receiver: Address,
    /// Value attached to the call, already credited to the receiver.
    pub value_received: TokenAmount,
}

/// Runtime is the VM's internal runtime object exposed to actors.
pub trait Runtime {
    /// Information related to the current message being executed.
    fn message(&self) -> &MessageInfo;

    /// The current chain epoch number.
    fn curr_epoch(&self) -> ChainEpoch;

    /// Network version the chain runs at the current epoch.
    fn network_version(&self) -> NetworkVersion;

    /// Version of the actor code being executed.
    fn actor_version(&self) -> ActorVersion;

    /// Protocol constants in effect.
    fn policy(&self) -> &Policy;

    /// Validates the caller against some predicate.
    fn validate_immediate_caller_accept_any(&mut self) -> Result<(), ActorError>;
    fn validate_immediate_caller_is(&mut self, addresses: &[Address]) -> Result<(), ActorError>;
    fn validate_immediate_caller_type(&mut self, types: &[ActorKind]) -> Result<(), ActorError>;

    /// The balance of the receiver.
    fn current_balance(&self) -> Result<TokenAmount, ActorError>;

    /// Resolves an address of any protocol to an ID address (via the Init actor's table).
    /// This allows resolution of externally-provided SECP, BLS, or actor addresses to the
    /// canonical form. If the argument is an ID address it is returned directly.
    fn resolve_address(&self, address: &Address) -> Result<Option<Address>, ActorError>;

    /// Look up the code ID at an actor address.
    fn get_actor_code_cid(&self, addr: &Address) -> Result<Option<Cid>, ActorError>;

    /// The block store actors read and write state through.
    fn store(&self) -> &dyn Ipld;

    /// Head of the receiver's state.
    fn state_root(&self) -> Result<Cid, ActorError>;

    /// Replaces the head of the receiver's state. The new head must already be stored.
    fn set_state_root(&mut self, root: &Cid) -> Result<(), ActorError>;

    /// Sends a message to another actor, returning the exit code and return value envelope.
    /// If the invoked method does not return successfully, its state changes (and that of any
    /// messages it sent in turn) will be rolled back.
    fn send(
        &mut self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<RawBytes, ActorError>;

    /// Computes an address for a new actor. The returned address is intended to uniquely
    /// refer to the actor even in the event of a chain re-org (whereas an ID-address might
    /// refer to a different actor after messages are re-ordered).
    fn new_actor_address(&mut self) -> Result<Address, ActorError>;

    /// Creates an actor with code `code_id` and address `address`, with empty state.
    /// May only be called by the Init actor.
    fn create_actor(&mut self, code_id: Cid, address: &Address) -> Result<(), ActorError>;

    /// Charges specified amount of `gas` for execution.
    /// `name` provides information about gas charging point
    fn charge_gas(&mut self, name: &'static str, compute: i64) -> Result<(), ActorError>;
}

/// Typed state access built on top of [`Runtime`].
pub trait RuntimeExt: Runtime {
    /// Loads the receiver's state.
    fn state<S: DeserializeOwned>(&self) -> Result<S, ActorError> {
        let root = self.state_root()?;
        self.store()
            .get_cbor(&root)
            .context_code(ExitCode::ErrIllegalState, "failed to load actor state")
    }

    /// Initializes the state object. This is only valid when the state has not yet been
    /// initialized.
    fn create<S: Serialize>(&mut self, obj: &S) -> Result<(), ActorError> {
        let root = self.state_root()?;
        if root != *EMPTY_ARR_CID {
            return Err(actor_error!(
                illegal_state;
                "failed to create state; expected empty array CID, got: {}",
                root
            ));
        }
        let new_root = self
            .store()
            .put_cbor(obj)
            .context_code(ExitCode::ErrSerialization, "failed to write actor state")?;
        self.set_state_root(&new_root)
    }

    /// Loads the state, lets `f` mutate it, then stores and commits the result. The closure
    /// only sees a shared runtime, so it can not send messages while the state is checked
    /// out.
    fn transaction<S, R, F>(&mut self, f: F) -> Result<R, ActorError>
    where
        S: Serialize + DeserializeOwned,
        F: FnOnce(&mut S, &Self) -> Result<R, ActorError>,
    {
        let mut st: S = self.state()?;
        let ret = f(&mut st, self)?;
        let new_root = self
            .store()
            .put_cbor(&st)
            .context_code(ExitCode::ErrSerialization, "failed to write actor state")?;
        self.set_state_root(&new_root)?;
        Ok(ret)
    }

    /// Sends a message whose parameters and return value are typed.
    fn send_typed<P, R>(
        &mut self,
        to: &Address,
        method: MethodNum,
        params: &P,
        value: TokenAmount,
    ) -> Result<R, ActorError>
    where
        P: crate::utils::encoding::Cbor,
        R: crate::utils::encoding::Cbor,
    {
        let params = RawBytes::serialize(params)
            .context_code(ExitCode::ErrSerialization, "failed to encode parameters")?;
        let ret = self.send(to, method, params, value)?;
        ret.deserialize()
            .context_code(ExitCode::ErrSerialization, "failed to decode return value")
    }

    /// Resolves `addr` to an ID address or fails with `ErrIllegalArgument`.
    fn resolve_id(&self, addr: &Address) -> Result<Address, ActorError> {
        self.resolve_address(addr)?.ok_or_else(|| {
            actor_error!(illegal_argument; "failed to resolve address {} to an ID", addr)
        })
    }
}

impl<R: Runtime + ?Sized> RuntimeExt for R {}
