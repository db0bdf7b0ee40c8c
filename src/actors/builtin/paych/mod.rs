// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::ActorKind;
use crate::actors::is_account_actor;
use crate::invoker::MethodTable;
use crate::runtime::{ActorError, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _};
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::version::ActorVersion;
use crate::utils::cid::{EMPTY_ARR_BYTES, EMPTY_ARR_CID};
use crate::utils::encoding::Cbor;
use crate::{actor_error, method_table, versioned_state};

/// Payment Channel actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    Settle = 3,
}

pub mod v0 {
    use cid::Cid;
    use serde_tuple::{Deserialize_tuple, Serialize_tuple};

    use crate::shim::address::Address;
    use crate::shim::clock::ChainEpoch;
    use crate::shim::econ::TokenAmount;

    /// A given payment channel actor is established by `from`
    /// to enable off-chain microtransactions to `to` address
    /// to be reconciled and tallied on chain.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
    pub struct State {
        /// Channel owner, who has funded the actor.
        pub from: Address,
        /// Recipient of payouts from channel.
        pub to: Address,
        /// Amount successfully redeemed through the payment channel, paid out on `Collect`.
        pub to_send: TokenAmount,
        /// Height at which the channel can be collected.
        pub settling_at: ChainEpoch,
        /// Height before which the channel `ToSend` cannot be collected.
        pub min_settle_height: ChainEpoch,
        /// Collections of lane states for the channel, maintained in ID order.
        pub lane_states: Cid,
    }

    impl State {
        pub fn new(from: Address, to: Address, empty_arr_cid: Cid) -> Self {
            Self {
                from,
                to,
                to_send: TokenAmount::zero(),
                settling_at: 0,
                min_settle_height: 0,
                lane_states: empty_arr_cid,
            }
        }
    }
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::PaymentChannel {
        V0(v0::State) => [V0, V2, V3, V4, V5, V6, V7],
    }
}

impl State {
    pub fn from(&self) -> Address {
        match self {
            State::V0(st) => st.from,
        }
    }

    pub fn to(&self) -> Address {
        match self {
            State::V0(st) => st.to,
        }
    }

    pub fn settling_at(&self) -> ChainEpoch {
        match self {
            State::V0(st) => st.settling_at,
        }
    }
}

/// Payment channel actor constructor parameters
#[derive(Debug, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct ConstructorParams {
    pub from: Address,
    pub to: Address,
}

impl Cbor for ConstructorParams {}

/// Payment Channel actor
pub struct Actor;

impl Actor {
    /// Constructor for Payment channel actor
    pub fn constructor(rt: &mut dyn Runtime, params: ConstructorParams) -> Result<(), ActorError> {
        // Only InitActor can create a payment channel actor. It creates the actor on
        // behalf of the payer/payee.
        rt.validate_immediate_caller_type(&[ActorKind::Init])?;

        // Check both parties are capable of signing vouchers
        let to = resolve_account(rt, &params.to)?;
        let from = resolve_account(rt, &params.from)?;

        rt.store().set(*EMPTY_ARR_CID, EMPTY_ARR_BYTES.to_vec())?;
        rt.create(&v0::State::new(from, to, *EMPTY_ARR_CID))
    }

    /// Moves the channel into settlement. Either party may call it once.
    pub fn settle(rt: &mut dyn Runtime, _: ()) -> Result<(), ActorError> {
        let st: v0::State = rt.state()?;
        rt.validate_immediate_caller_is(&[st.from, st.to])?;

        let settle_delay = rt.policy().payment_channel_settle_delay;
        let epoch = rt.curr_epoch();
        rt.transaction(|st: &mut v0::State, _| {
            if st.settling_at != 0 {
                return Err(actor_error!(illegal_state; "channel already settling"));
            }

            st.settling_at = epoch + settle_delay;
            if st.settling_at < st.min_settle_height {
                st.settling_at = st.min_settle_height;
            }

            Ok(())
        })
    }
}

/// Resolves an address to a canonical ID address and requires it to address an account actor.
fn resolve_account(rt: &dyn Runtime, raw: &Address) -> Result<Address, ActorError> {
    let resolved = rt.resolve_id(raw)?;

    let code_cid = rt
        .get_actor_code_cid(&resolved)?
        .ok_or_else(|| actor_error!(illegal_argument; "no code for address {}", resolved))?;
    if !is_account_actor(&code_cid) {
        return Err(actor_error!(
            forbidden,
            "actor {} must be an account, was {}",
            raw,
            code_cid
        ));
    }
    Ok(resolved)
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    method_table!(ActorKind::PaymentChannel, version, Method {
        Constructor => Actor::constructor,
        Settle => Actor::settle,
    })
}
