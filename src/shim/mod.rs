// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Chain primitive types shared by the store, state tree and actor code.

pub mod address;
pub mod clock;
pub mod econ;
pub mod error;
pub mod sector;
pub mod version;

/// Identifier of an actor, the payload of an ID address.
pub type ActorID = u64;

/// Method number of an actor entry point.
pub type MethodNum = u64;

/// Power measured in bytes.
pub type StoragePower = num_bigint::BigInt;

/// Weight of a deal, measured in byte-epochs.
pub type DealWeight = num_bigint::BigInt;
