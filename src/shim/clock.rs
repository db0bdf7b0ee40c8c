// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

/// Epoch number of the chain state, which acts as a proxy for time within the VM.
pub type ChainEpoch = i64;

/// Duration of each epoch in seconds.
pub const EPOCH_DURATION_SECONDS: i64 = 30;
pub const SECONDS_IN_DAY: i64 = 86400;
pub const EPOCHS_IN_HOUR: ChainEpoch = 3600 / EPOCH_DURATION_SECONDS;
pub const EPOCHS_IN_DAY: ChainEpoch = SECONDS_IN_DAY / EPOCH_DURATION_SECONDS;
pub const EPOCHS_IN_YEAR: ChainEpoch = 365 * EPOCHS_IN_DAY;
