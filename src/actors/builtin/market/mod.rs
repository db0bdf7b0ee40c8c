// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod balance_table;
pub mod v0;

pub use self::balance_table::BalanceTable;

use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::{ActorKind, make_empty_map, miner};
use crate::actors::{SYSTEM_ACTOR_ADDR, lookup_code};
use crate::db::Ipld;
use crate::invoker::MethodTable;
use crate::runtime::{
    ActorError, AsActorError as _, METHOD_CONSTRUCTOR, METHOD_SEND, Runtime, RuntimeExt as _,
};
use crate::shim::address::Address;
use crate::shim::econ::TokenAmount;
use crate::shim::error::ExitCode;
use crate::shim::version::ActorVersion;
use crate::utils::cid::{EMPTY_ARR_BYTES, EMPTY_ARR_CID};
use crate::utils::encoding::{Cbor, RawBytes};
use crate::{actor_error, method_table, versioned_state};

/// Market actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    AddBalance = 2,
    WithdrawBalance = 3,
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::Market {
        V0(v0::State) => [V0, V2, V3, V4, V5, V6, V7],
    }
}

impl State {
    pub fn next_id(&self) -> v0::DealID {
        match self {
            State::V0(st) => st.next_id,
        }
    }

    pub fn escrow_balance<BS: Ipld>(
        &self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<TokenAmount, ActorError> {
        match self {
            State::V0(st) => st.escrow_balance(store, version, addr),
        }
    }

    pub fn locked_balance<BS: Ipld>(
        &self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<TokenAmount, ActorError> {
        match self {
            State::V0(st) => st.locked_balance(store, version, addr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct WithdrawBalanceParams {
    pub provider_or_client: Address,
    pub amount: TokenAmount,
}

impl Cbor for WithdrawBalanceParams {}

/// Market actor
pub struct Actor;

impl Actor {
    pub fn constructor(rt: &mut dyn Runtime, _: ()) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;
        let empty_map = make_empty_map::<_, TokenAmount>(rt.store())?;
        rt.store().set(*EMPTY_ARR_CID, EMPTY_ARR_BYTES.to_vec())?;
        rt.create(&v0::State::new(empty_map, *EMPTY_ARR_CID))
    }

    /// Deposits the received value into the balance held in escrow.
    pub fn add_balance(
        rt: &mut dyn Runtime,
        provider_or_client: Address,
    ) -> Result<(), ActorError> {
        let msg_value = rt.message().value_received.clone();
        if msg_value <= TokenAmount::zero() {
            return Err(actor_error!(illegal_argument;
                "balance to add must be greater than zero was: {}", msg_value));
        }

        rt.validate_immediate_caller_type(&[ActorKind::Account, ActorKind::Multisig])?;

        let (nominal, _, _) = escrow_address(rt, &provider_or_client)?;

        rt.transaction(|st: &mut v0::State, rt| {
            st.add_escrow(rt.store(), rt.actor_version(), &nominal, &msg_value)
        })
    }

    /// Attempt to withdraw the specified amount from the balance held in escrow.
    /// If less than the specified amount is available, yields the entire available balance.
    pub fn withdraw_balance(
        rt: &mut dyn Runtime,
        params: WithdrawBalanceParams,
    ) -> Result<TokenAmount, ActorError> {
        if params.amount.is_negative() {
            return Err(actor_error!(illegal_argument;
                "negative amount: {}", params.amount));
        }

        let (nominal, recipient, approved) = escrow_address(rt, &params.provider_or_client)?;
        // for providers -> only corresponding owner or worker can withdraw
        // for clients -> only the client i.e the recipient can withdraw
        rt.validate_immediate_caller_is(&approved)?;

        let amount_extracted = rt.transaction(|st: &mut v0::State, rt| {
            st.withdraw_escrow(rt.store(), rt.actor_version(), &nominal, &params.amount)
        })?;

        rt.send(
            &recipient,
            METHOD_SEND,
            RawBytes::default(),
            amount_extracted.clone(),
        )?;

        Ok(amount_extracted)
    }
}

/// Resolves a provider or client address to the canonical form against which a balance
/// should be held, and the designated recipient address of withdrawals (which is the same,
/// for simple account parties).
fn escrow_address(
    rt: &mut dyn Runtime,
    addr: &Address,
) -> Result<(Address, Address, Vec<Address>), ActorError> {
    // Resolve the provided address to the canonical form against which the balance is held.
    let nominal = rt.resolve_id(addr)?;

    let code_id = rt
        .get_actor_code_cid(&nominal)?
        .with_context_code(ExitCode::ErrIllegalArgument, || {
            format!("no code for address {nominal}")
        })?;

    if matches!(lookup_code(&code_id), Ok((ActorKind::Miner, _))) {
        // Storage miner actor entry; implied funds recipient is the associated owner address.
        let ret: miner::GetControlAddressesReturn = rt.send_typed(
            &nominal,
            miner::Method::ControlAddresses as u64,
            &(),
            TokenAmount::zero(),
        )?;
        return Ok((nominal, ret.owner, vec![ret.owner, ret.worker]));
    }

    Ok((nominal, nominal, vec![nominal]))
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    method_table!(ActorKind::Market, version, Method {
        Constructor => Actor::constructor,
        AddBalance => Actor::add_balance,
        WithdrawBalance => Actor::withdraw_balance,
    })
}
