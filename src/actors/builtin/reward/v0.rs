// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use num_bigint::BigInt;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::{FilterEstimate, Spacetime, baseline_power_from_prev, init_baseline_power};
use crate::shim::StoragePower;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::utils::encoding::bigint_ser;

/// 1 EiB
pub const BASELINE_INITIAL_VALUE: u64 = 1 << 60;

/// Floor(e^(ln[1 + 200%] / epochsInYear) * 2^128) less 2^128, growing the baseline 200% in
/// one year of epochs.
pub const BASELINE_EXPONENT_FRACTION: u128 = 355_630_313_228_972_420_971_125_415_398_272;

/// Reward actor state
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    /// Target cumsum_realized needs to reach for effective_network_time to increase,
    /// in byte-epochs.
    #[serde(with = "bigint_ser")]
    pub cumsum_baseline: Spacetime,
    /// Cumulative sum of network power capped by the baseline, in byte-epochs.
    #[serde(with = "bigint_ser")]
    pub cumsum_realized: Spacetime,
    /// Ceiling of real effective network time `theta`.
    pub effective_network_time: ChainEpoch,
    /// Baseline power at the effective network time epoch.
    #[serde(with = "bigint_ser")]
    pub effective_baseline_power: StoragePower,
    /// The reward to be paid in per WinCount to block producers.
    pub this_epoch_reward: TokenAmount,
    pub this_epoch_reward_smoothed: FilterEstimate,
    /// The baseline power the network is targeting at `epoch`.
    #[serde(with = "bigint_ser")]
    pub this_epoch_baseline_power: StoragePower,
    /// Epoch tracks for which epoch the reward was computed.
    pub epoch: ChainEpoch,
    /// Tracks the total FIL awarded to block miners.
    pub total_mined: TokenAmount,
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
            total_mined: TokenAmount::zero(),
        };
        st.update_to_next_epoch(curr_realized_power);
        st
    }

    /// Advances the state to the next epoch, given the current realized power.
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
