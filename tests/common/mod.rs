// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

#![allow(dead_code)]

use forest_actor_vm::config::Config;
use forest_actor_vm::db::MemoryDB;
use forest_actor_vm::interpreter::{Message, Vm};
use forest_actor_vm::shim::MethodNum;
use forest_actor_vm::shim::address::Address;
use forest_actor_vm::shim::econ::TokenAmount;
use forest_actor_vm::utils::encoding::RawBytes;

/// ID of the verified registry root used by test genesis states.
pub const ROOT_KEY: Address = Address::new_id(80);

/// Routes interpreter logs to the test harness. Honors `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn bls(n: u8) -> Address {
    Address::new_bls(&[n; 48]).unwrap()
}

pub fn genesis(config: &Config) -> Vm<MemoryDB> {
    init_logging();
    Vm::genesis(MemoryDB::default(), config, &ROOT_KEY).unwrap()
}

pub fn message(
    from: Address,
    to: Address,
    sequence: u64,
    method_num: MethodNum,
    params: RawBytes,
) -> Message {
    Message {
        from,
        to,
        sequence,
        value: TokenAmount::zero(),
        method_num,
        params,
        gas_limit: 100_000_000,
    }
}
