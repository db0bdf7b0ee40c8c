// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use num_bigint::BigInt;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::{FilterEstimate, Spacetime, baseline_power_from_prev, init_baseline_power};
use crate::shim::StoragePower;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::utils::encoding::bigint_ser;

/// 2.5057116798121726 EiB
pub const BASELINE_INITIAL_VALUE: u64 = 2_888_888_880_000_000_000;

/// Floor(e^(ln[1 + 100%] / epochsInYear) * 2^128) less 2^128, doubling the baseline in one
/// year of epochs.
pub const BASELINE_EXPONENT_FRACTION: u128 = 224_377_702_615_002_589_582_494_545_262_197;

/// Reward actor state. The total mined counter of the first layout is split into the
/// reward paid for storage power and the simple and baseline minting totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    #[serde(with = "bigint_ser")]
    pub cumsum_baseline: Spacetime,
    #[serde(with = "bigint_ser")]
    pub cumsum_realized: Spacetime,
    pub effective_network_time: ChainEpoch,
    #[serde(with = "bigint_ser")]
    pub effective_baseline_power: StoragePower,
    pub this_epoch_reward: TokenAmount,
    pub this_epoch_reward_smoothed: FilterEstimate,
    #[serde(with = "bigint_ser")]
    pub this_epoch_baseline_power: StoragePower,
    pub epoch: ChainEpoch,
    /// Total FIL awarded to block miners.
    pub total_storage_power_reward: TokenAmount,
    /// Simple and baseline totals are constants used for computing rewards.
    pub simple_total: TokenAmount,
    pub baseline_total: TokenAmount,
}

impl State {
    pub fn new(curr_realized_power: &StoragePower) -> Self {
        let exponent = exponent();
        let initial = BigInt::from(BASELINE_INITIAL_VALUE);
        let smoothed = FilterEstimate::initial_reward();
        let mut st = Self {
            cumsum_baseline: Spacetime::default(),
            cumsum_realized: Spacetime::default(),
            effective_network_time: 0,
            this_epoch_reward: TokenAmount::from_atto(smoothed.estimate()),
            this_epoch_reward_smoothed: smoothed,
            this_epoch_baseline_power: init_baseline_power(&initial, &exponent),
            effective_baseline_power: initial,
            epoch: -1,
            total_storage_power_reward: TokenAmount::zero(),
            simple_total: TokenAmount::from_whole(330_000_000),
            baseline_total: TokenAmount::from_whole(770_000_000),
        };
        st.update_to_next_epoch(curr_realized_power);
        st
    }

    pub fn update_to_next_epoch(&mut self, curr_realized_power: &StoragePower) {
        let exponent = exponent();
        self.epoch += 1;
        self.this_epoch_baseline_power =
            baseline_power_from_prev(&self.this_epoch_baseline_power, &exponent);
        self.cumsum_realized += curr_realized_power.min(&self.this_epoch_baseline_power);
        while self.cumsum_realized > self.cumsum_baseline {
            self.effective_network_time += 1;
            self.effective_baseline_power =
                baseline_power_from_prev(&self.effective_baseline_power, &exponent);
            self.cumsum_baseline += &self.effective_baseline_power;
        }
    }
}

fn exponent() -> BigInt {
    (BigInt::from(1) << 128u32) + BASELINE_EXPONENT_FRACTION
}
