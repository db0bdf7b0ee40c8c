// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use tracing::{debug, trace};

use super::gas::GasCharge;
use super::{MAX_CALL_DEPTH, Vm};
use crate::actors::builtin::account;
use crate::actors::policy::Policy;
use crate::actors::universal::Universal;
use crate::actors::{
    ActorKind, SYSTEM_ACTOR_ADDR, builtin_code, is_builtin_actor, is_singleton_actor, lookup_code,
};
use crate::db::Ipld;
use crate::runtime::{
    ActorContext as _, ActorError, AsActorError as _, METHOD_CONSTRUCTOR, METHOD_SEND, MessageInfo,
    Runtime,
};
use crate::shim::MethodNum;
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::error::ExitCode;
use crate::shim::version::{ActorVersion, NetworkVersion};
use crate::state_tree::ActorState;
use crate::utils::cid::EMPTY_ARR_CID;
use crate::utils::encoding::{RawBytes, to_vec};

/// Runtime handed to one actor method invocation.
pub struct InvocationContext<'a, S> {
    vm: &'a mut Vm<S>,
    message: MessageInfo,
    depth: u32,
    caller_validated: bool,
}

impl<S: Ipld> Vm<S> {
    /// Runs a send inside a state snapshot, reverting every write it made if it aborts.
    pub(super) fn call(
        &mut self,
        from: Address,
        to: &Address,
        method: MethodNum,
        params: &RawBytes,
        value: &TokenAmount,
        depth: u32,
    ) -> Result<RawBytes, ActorError> {
        self.state.snapshot();
        let res = self.send(from, to, method, params, value, depth);
        if let Err(e) = &res {
            debug!(%from, %to, method, exit_code = %e.exit_code(), "reverting aborted send");
            self.state.revert_to_snapshot()?;
        }
        self.state.clear_snapshot()?;
        res
    }

    fn send(
        &mut self,
        from: Address,
        to: &Address,
        method: MethodNum,
        params: &RawBytes,
        value: &TokenAmount,
        depth: u32,
    ) -> Result<RawBytes, ActorError> {
        if depth > MAX_CALL_DEPTH {
            return Err(ActorError::unchecked(
                ExitCode::SysErrForbidden,
                "message execution exceeds call depth".to_owned(),
            ));
        }
        trace!(%from, %to, method, %value, depth, "send");
        self.gas
            .charge_gas(self.prices.on_method_invocation(value, method))?;
        self.gas.charge_gas(self.prices.on_params(params.bytes().len()))?;

        let to = match self.state.lookup_id(to)? {
            Some(id) => id,
            None => self.try_create_account_actor(to, depth)?,
        };
        let code = self
            .state
            .get_actor(&to)?
            .with_context_code(ExitCode::SysErrInvalidReceiver, || {
                format!("actor {to} does not exist")
            })?
            .code;

        self.transfer(&from, &to, value)?;

        let ret = if method == METHOD_SEND {
            RawBytes::default()
        } else {
            let invoker = self.invoker;
            let mut ctx = InvocationContext {
                vm: self,
                message: MessageInfo {
                    caller: from,
                    receiver: to,
                    value_received: value.clone(),
                },
                depth,
                caller_validated: false,
            };
            let ret = invoker.invoke(&mut ctx, &code, method, params)?;
            if !ctx.caller_validated {
                return Err(ActorError::unchecked(
                    ExitCode::SysErrIllegalActor,
                    "caller MUST be validated during method execution".to_owned(),
                ));
            }
            ret
        };
        self.gas
            .charge_gas(self.prices.on_chain_return_value(ret.bytes().len()))?;
        Ok(ret)
    }

    /// Moves `value` from `from` to `to`. Both must be ID addresses of existing actors.
    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        value: &TokenAmount,
    ) -> Result<(), ActorError> {
        if value.is_negative() {
            return Err(ActorError::unchecked(
                ExitCode::SysErrForbidden,
                "attempted to transfer negative value".to_owned(),
            ));
        }
        if value.is_zero() || from == to {
            return Ok(());
        }

        let mut sender = self
            .state
            .get_actor(from)?
            .with_context_code(ExitCode::SysErrSenderInvalid, || {
                format!("transfer failed, sender {from} not found")
            })?;
        sender.deduct_funds(value).map_err(|e| {
            ActorError::unchecked(
                ExitCode::SysErrInsufficientFunds,
                format!("transfer failed when deducting funds ({value}): {e}"),
            )
        })?;
        let mut receiver = self
            .state
            .get_actor(to)?
            .with_context_code(ExitCode::SysErrInvalidReceiver, || {
                format!("transfer failed, receiver {to} not found")
            })?;
        receiver.deposit_funds(value);

        self.state.set_actor(from, sender)?;
        self.state.set_actor(to, receiver)?;
        Ok(())
    }

    /// Creates an account actor for a key address that has none yet.
    pub(super) fn try_create_account_actor(
        &mut self,
        addr: &Address,
        depth: u32,
    ) -> Result<Address, ActorError> {
        if !addr.is_key_address() {
            return Err(ActorError::unchecked(
                ExitCode::SysErrInvalidReceiver,
                format!("cannot create account for address {addr} of type {}", addr.protocol()),
            ));
        }
        self.gas.charge_gas(self.prices.on_create_actor())?;

        let id = self.state.register_new_address(addr)?;
        let code = builtin_code(ActorKind::Account, self.actor_version)
            .with_context_code(ExitCode::ErrIllegalState, || {
                format!("no account actor at {}", self.actor_version)
            })?;
        self.state.set_actor(
            &id,
            ActorState::new(code, *EMPTY_ARR_CID, TokenAmount::zero(), 0),
        )?;

        let params = RawBytes::serialize(addr)?;
        self.send(
            SYSTEM_ACTOR_ADDR,
            &id,
            METHOD_CONSTRUCTOR,
            &params,
            &TokenAmount::zero(),
            depth,
        )
        .context("failed to invoke account constructor")?;
        debug!(%addr, %id, "created account actor");
        Ok(id)
    }

    /// Returns the public key address of an account actor.
    pub fn resolve_to_key_addr(&self, addr: &Address) -> Result<Address, ActorError> {
        if addr.is_key_address() {
            return Ok(*addr);
        }
        let actor = self
            .state
            .get_actor(addr)?
            .with_context_code(ExitCode::ErrIllegalArgument, || {
                format!("failed to find actor: {addr}")
            })?;
        let state = Universal::<account::State>::load_actor(self.state.store(), &actor)
            .with_context_code(ExitCode::ErrIllegalArgument, || {
                format!("{addr} is not an account actor")
            })?;
        Ok(state.pubkey_address())
    }
}

impl<S: Ipld> InvocationContext<'_, S> {
    fn abort_if_already_validated(&mut self) -> Result<(), ActorError> {
        if self.caller_validated {
            return Err(ActorError::unchecked(
                ExitCode::SysErrIllegalActor,
                "Method must validate caller identity exactly once".to_owned(),
            ));
        }
        self.caller_validated = true;
        Ok(())
    }

    fn receiver(&self) -> Result<ActorState, ActorError> {
        let receiver = self.message.receiver;
        self.vm
            .state
            .get_actor(&receiver)?
            .with_context_code(ExitCode::ErrIllegalState, || {
                format!("receiver {receiver} not found")
            })
    }
}

impl<S: Ipld> Runtime for InvocationContext<'_, S> {
    fn message(&self) -> &MessageInfo {
        &self.message
    }

    fn curr_epoch(&self) -> ChainEpoch {
        self.vm.epoch
    }

    fn network_version(&self) -> NetworkVersion {
        self.vm.network_version
    }

    fn actor_version(&self) -> ActorVersion {
        self.vm.actor_version
    }

    fn policy(&self) -> &Policy {
        &self.vm.policy
    }

    fn validate_immediate_caller_accept_any(&mut self) -> Result<(), ActorError> {
        self.abort_if_already_validated()
    }

    fn validate_immediate_caller_is(&mut self, addresses: &[Address]) -> Result<(), ActorError> {
        self.abort_if_already_validated()?;
        let caller = self.message.caller;
        if addresses.contains(&caller) {
            Ok(())
        } else {
            Err(ActorError::unchecked(
                ExitCode::SysErrForbidden,
                format!("caller {caller} is not one of {addresses:?}"),
            ))
        }
    }

    fn validate_immediate_caller_type(&mut self, types: &[ActorKind]) -> Result<(), ActorError> {
        self.abort_if_already_validated()?;
        let caller = self.message.caller;
        let kind = self
            .vm
            .state
            .get_actor(&caller)?
            .and_then(|actor| lookup_code(&actor.code).ok())
            .map(|(kind, _)| kind);
        match kind {
            Some(kind) if types.contains(&kind) => Ok(()),
            _ => Err(ActorError::unchecked(
                ExitCode::SysErrForbidden,
                format!("caller {caller} of type {kind:?} is not one of {types:?}"),
            )),
        }
    }

    fn current_balance(&self) -> Result<TokenAmount, ActorError> {
        Ok(self.receiver()?.balance)
    }

    fn resolve_address(&self, address: &Address) -> Result<Option<Address>, ActorError> {
        Ok(self.vm.state.lookup_id(address)?)
    }

    fn get_actor_code_cid(&self, addr: &Address) -> Result<Option<Cid>, ActorError> {
        Ok(self.vm.state.get_actor(addr)?.map(|actor| actor.code))
    }

    fn store(&self) -> &dyn Ipld {
        self.vm.state.store()
    }

    fn state_root(&self) -> Result<Cid, ActorError> {
        Ok(self.receiver()?.state)
    }

    fn set_state_root(&mut self, root: &Cid) -> Result<(), ActorError> {
        let receiver = self.message.receiver;
        self.vm.state.mutate_actor(&receiver, |actor| {
            actor.state = *root;
            Ok(())
        })?;
        Ok(())
    }

    fn send(
        &mut self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<RawBytes, ActorError> {
        let from = self.message.receiver;
        self.vm.call(from, to, method, &params, &value, self.depth + 1)
    }

    fn new_actor_address(&mut self) -> Result<Address, ActorError> {
        let origin = self.vm.resolve_to_key_addr(&self.vm.origin)?;
        let mut bytes = to_vec(&origin)?;
        bytes.extend_from_slice(&self.vm.origin_nonce.to_be_bytes());
        bytes.extend_from_slice(&self.vm.num_actors_created.to_be_bytes());
        self.vm.num_actors_created += 1;
        Ok(Address::new_actor(&bytes))
    }

    fn create_actor(&mut self, code_id: Cid, address: &Address) -> Result<(), ActorError> {
        if !is_builtin_actor(&code_id) {
            return Err(ActorError::unchecked(
                ExitCode::SysErrIllegalArgument,
                format!("can only create builtin actors, got {code_id}"),
            ));
        }
        if is_singleton_actor(&code_id) {
            return Err(ActorError::unchecked(
                ExitCode::SysErrIllegalArgument,
                "can only have one instance of singleton actors".to_owned(),
            ));
        }
        if self.vm.state.get_actor(address)?.is_some() {
            return Err(ActorError::unchecked(
                ExitCode::SysErrIllegalArgument,
                format!("actor address {address} already exists"),
            ));
        }
        self.vm.gas.charge_gas(self.vm.prices.on_create_actor())?;
        self.vm.state.set_actor(
            address,
            ActorState::new(code_id, *EMPTY_ARR_CID, TokenAmount::zero(), 0),
        )?;
        trace!(%address, %code_id, "created actor");
        Ok(())
    }

    fn charge_gas(&mut self, name: &'static str, compute: i64) -> Result<(), ActorError> {
        self.vm.gas.charge_gas(GasCharge::new(name, compute, 0))
    }
}
