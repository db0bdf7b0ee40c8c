// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod bitfield;
pub mod cid;
pub mod encoding;
pub mod version;
