// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod v0;
pub mod v2;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use crate::actors::{ActorKind, SYSTEM_ACTOR_ADDR};
use crate::invoker::MethodTable;
use crate::runtime::{ActorError, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _};
use crate::shim::StoragePower;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::version::ActorVersion;
use crate::utils::encoding::{Cbor, bigint_ser, bigint_ser::BigIntDe};
use crate::{method_table, versioned_state};

/// Power multiplied by time, in byte-epochs.
pub type Spacetime = BigInt;

/// 36.266260308195979333 FIL
const INITIAL_REWARD_POSITION_ESTIMATE: u128 = 36_266_260_308_195_979_333;
/// -1.0982489*10^-7 FIL per epoch. Change of simple minted tokens between epochs 0 and 1.
const INITIAL_REWARD_VELOCITY_ESTIMATE: i64 = -109_897_758_509;

/// Reward actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    ThisEpochReward = 3,
}

/// Alpha-beta filter estimate, in Q.128 fixed point.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct FilterEstimate {
    #[serde(with = "bigint_ser")]
    pub position: BigInt,
    #[serde(with = "bigint_ser")]
    pub velocity: BigInt,
}

impl FilterEstimate {
    /// Estimate from whole-unit position and velocity.
    pub fn new(position: BigInt, velocity: BigInt) -> Self {
        Self {
            position: position << 128u32,
            velocity: velocity << 128u32,
        }
    }

    /// Position rounded down to whole units.
    pub fn estimate(&self) -> BigInt {
        &self.position >> 128u32
    }

    fn initial_reward() -> Self {
        Self::new(
            BigInt::from(INITIAL_REWARD_POSITION_ESTIMATE),
            BigInt::from(INITIAL_REWARD_VELOCITY_ESTIMATE),
        )
    }
}

/// Baseline power one epoch after `prev`, given a Q.128 growth exponent.
fn baseline_power_from_prev(prev: &StoragePower, exponent: &BigInt) -> StoragePower {
    (prev * exponent) >> 128u32
}

/// Baseline power one epoch before `initial`, so that the first update lands on it.
fn init_baseline_power(initial: &StoragePower, exponent: &BigInt) -> StoragePower {
    (initial << 128u32) / exponent
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::Reward {
        V0(v0::State) => [V0],
        V2(v2::State) => [V2, V3, V4, V5, V6, V7],
    }
}

impl State {
    pub fn epoch(&self) -> ChainEpoch {
        match self {
            State::V0(st) => st.epoch,
            State::V2(st) => st.epoch,
        }
    }

    pub fn this_epoch_reward(&self) -> &TokenAmount {
        match self {
            State::V0(st) => &st.this_epoch_reward,
            State::V2(st) => &st.this_epoch_reward,
        }
    }

    pub fn this_epoch_reward_smoothed(&self) -> &FilterEstimate {
        match self {
            State::V0(st) => &st.this_epoch_reward_smoothed,
            State::V2(st) => &st.this_epoch_reward_smoothed,
        }
    }

    pub fn this_epoch_baseline_power(&self) -> &StoragePower {
        match self {
            State::V0(st) => &st.this_epoch_baseline_power,
            State::V2(st) => &st.this_epoch_baseline_power,
        }
    }

    /// Total FIL paid to block producers so far.
    pub fn total_storage_power_reward(&self) -> &TokenAmount {
        match self {
            State::V0(st) => &st.total_mined,
            State::V2(st) => &st.total_storage_power_reward,
        }
    }
}

/// Network power realized at genesis, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstructorParams(pub Option<BigIntDe>);

impl Cbor for ConstructorParams {}

/// Return of ThisEpochReward in the first actor version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ThisEpochRewardReturnV0 {
    pub this_epoch_reward: TokenAmount,
    pub this_epoch_reward_smoothed: FilterEstimate,
    #[serde(with = "bigint_ser")]
    pub this_epoch_baseline_power: StoragePower,
}

impl Cbor for ThisEpochRewardReturnV0 {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ThisEpochRewardReturn {
    pub this_epoch_reward_smoothed: FilterEstimate,
    #[serde(with = "bigint_ser")]
    pub this_epoch_baseline_power: StoragePower,
}

impl Cbor for ThisEpochRewardReturn {}

/// Reward Actor
pub struct Actor;

impl Actor {
    /// Constructor for Reward actor
    pub fn constructor(rt: &mut dyn Runtime, params: ConstructorParams) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;
        let power = params.0.map(|p| p.0).unwrap_or_default();
        let st = match rt.actor_version() {
            ActorVersion::V0 => State::V0(v0::State::new(&power)),
            _ => State::V2(v2::State::new(&power)),
        };
        rt.create(&st)
    }

    /// The first reward layout reports the unsmoothed reward as well.
    pub fn this_epoch_reward_v0(
        rt: &mut dyn Runtime,
        _: (),
    ) -> Result<ThisEpochRewardReturnV0, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let st: v0::State = rt.state()?;
        Ok(ThisEpochRewardReturnV0 {
            this_epoch_reward: st.this_epoch_reward,
            this_epoch_reward_smoothed: st.this_epoch_reward_smoothed,
            this_epoch_baseline_power: st.this_epoch_baseline_power,
        })
    }

    pub fn this_epoch_reward(
        rt: &mut dyn Runtime,
        _: (),
    ) -> Result<ThisEpochRewardReturn, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let st: v2::State = rt.state()?;
        Ok(ThisEpochRewardReturn {
            this_epoch_reward_smoothed: st.this_epoch_reward_smoothed,
            this_epoch_baseline_power: st.this_epoch_baseline_power,
        })
    }
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    match version {
        ActorVersion::V0 => method_table!(ActorKind::Reward, version, Method {
            Constructor => Actor::constructor,
            ThisEpochReward => Actor::this_epoch_reward_v0,
        }),
        _ => method_table!(ActorKind::Reward, version, Method {
            Constructor => Actor::constructor,
            ThisEpochReward => Actor::this_epoch_reward,
        }),
    }
}
