// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod common;

use forest_actor_vm::actors::builtin::{init, market, paych, verifreg};
use forest_actor_vm::actors::universal::Universal;
use forest_actor_vm::actors::{
    ActorKind, INIT_ACTOR_ADDR, STORAGE_MARKET_ACTOR_ADDR, VERIFIED_REGISTRY_ACTOR_ADDR,
    builtin_code,
};
use forest_actor_vm::config::Config;
use forest_actor_vm::db::MemoryDB;
use forest_actor_vm::interpreter::Vm;
use forest_actor_vm::runtime::METHOD_SEND;
use forest_actor_vm::shim::MethodNum;
use forest_actor_vm::shim::address::Address;
use forest_actor_vm::shim::econ::TokenAmount;
use forest_actor_vm::shim::error::ExitCode;
use forest_actor_vm::utils::encoding::RawBytes;
use num_bigint::BigInt;
use pretty_assertions::assert_eq;

use crate::common::{ROOT_KEY, bls, genesis, message};

const DEVNET: &str = r#"
network_name = "devnet"

[policy]
payment_channel_settle_delay = 7
minimum_verified_deal_size = 256
"#;

fn create_paych(vm: &mut Vm<MemoryDB>, from: Address, to: Address) -> Address {
    let params = init::ExecParams {
        code_cid: builtin_code(ActorKind::PaymentChannel, vm.actor_version()).unwrap(),
        constructor_params: RawBytes::serialize(&paych::ConstructorParams { from, to }).unwrap(),
    };
    let ret = vm
        .apply_message(&message(
            from,
            INIT_ACTOR_ADDR,
            0,
            init::Method::Exec as MethodNum,
            RawBytes::serialize(&params).unwrap(),
        ))
        .unwrap();
    assert_eq!(ret.exit_code, ExitCode::Ok, "{:?}", ret.failure_info);
    let ret: init::ExecReturn = ret.return_data.deserialize().unwrap();
    ret.id_address
}

#[test]
fn settle_delay_comes_from_config() {
    let config = Config::from_toml(DEVNET).unwrap();
    let mut vm = genesis(&config);
    vm.create_account(&bls(1), TokenAmount::from_atto(100)).unwrap();
    vm.create_account(&bls(2), TokenAmount::zero()).unwrap();
    let ch = create_paych(&mut vm, bls(1), bls(2));

    vm.set_epoch(40);
    let ret = vm
        .apply_message(&message(
            bls(2),
            ch,
            0,
            paych::Method::Settle as MethodNum,
            RawBytes::default(),
        ))
        .unwrap();
    assert_eq!(ret.exit_code, ExitCode::Ok, "{:?}", ret.failure_info);

    let actor = vm.get_actor(&ch).unwrap().unwrap();
    let st = Universal::<paych::State>::load_actor(vm.state_tree().store(), &actor).unwrap();
    assert_eq!(st.settling_at(), 47);
}

#[test]
fn outsiders_cannot_settle() {
    let mut vm = genesis(&Config::default());
    for n in 1..=3 {
        vm.create_account(&bls(n), TokenAmount::from_atto(10)).unwrap();
    }
    let ch = create_paych(&mut vm, bls(1), bls(2));
    let ret = vm
        .apply_message(&message(
            bls(3),
            ch,
            0,
            paych::Method::Settle as MethodNum,
            RawBytes::default(),
        ))
        .unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrForbidden);
}

#[test]
fn market_escrow_through_messages() {
    let mut vm = genesis(&Config::default());
    let client = vm.create_account(&bls(1), TokenAmount::from_atto(1000)).unwrap();

    let mut msg = message(
        bls(1),
        STORAGE_MARKET_ACTOR_ADDR,
        0,
        market::Method::AddBalance as MethodNum,
        RawBytes::serialize(&client).unwrap(),
    );
    msg.value = TokenAmount::from_atto(300);
    let ret = vm.apply_message(&msg).unwrap();
    assert_eq!(ret.exit_code, ExitCode::Ok, "{:?}", ret.failure_info);

    let params = market::WithdrawBalanceParams {
        provider_or_client: client,
        amount: TokenAmount::from_atto(120),
    };
    let ret = vm
        .apply_message(&message(
            bls(1),
            STORAGE_MARKET_ACTOR_ADDR,
            1,
            market::Method::WithdrawBalance as MethodNum,
            RawBytes::serialize(&params).unwrap(),
        ))
        .unwrap();
    assert_eq!(ret.exit_code, ExitCode::Ok, "{:?}", ret.failure_info);
    let withdrawn: TokenAmount = ret.return_data.deserialize().unwrap();
    assert_eq!(withdrawn, TokenAmount::from_atto(120));

    let market_actor = vm.get_actor(&STORAGE_MARKET_ACTOR_ADDR).unwrap().unwrap();
    assert_eq!(market_actor.balance, TokenAmount::from_atto(180));
    let st = Universal::<market::State>::load_actor(vm.state_tree().store(), &market_actor)
        .unwrap();
    assert_eq!(
        st.escrow_balance(vm.state_tree().store(), st.version(), &client)
            .unwrap(),
        TokenAmount::from_atto(180)
    );
    assert_eq!(
        vm.get_actor(&client).unwrap().unwrap().balance,
        TokenAmount::from_atto(820)
    );
}

#[test]
fn verified_registry_root_from_genesis() {
    let config = Config::from_toml(DEVNET).unwrap();
    let mut vm = genesis(&config);
    vm.create_account(&bls(1), TokenAmount::zero()).unwrap();

    let params = verifreg::AddVerifierParams {
        address: bls(1),
        allowance: BigInt::from(1024),
    };
    let msg = message(
        ROOT_KEY,
        VERIFIED_REGISTRY_ACTOR_ADDR,
        0,
        verifreg::Method::AddVerifier as MethodNum,
        RawBytes::serialize(&params).unwrap(),
    );
    // the root key has no actor of its own, so the message is applied implicitly
    let ret = vm.apply_implicit_message(&msg).unwrap();
    assert_eq!(ret.exit_code, ExitCode::Ok, "{:?}", ret.failure_info);

    let actor = vm.get_actor(&VERIFIED_REGISTRY_ACTOR_ADDR).unwrap().unwrap();
    let st = Universal::<verifreg::State>::load_actor(vm.state_tree().store(), &actor).unwrap();
    assert_eq!(st.root_key(), ROOT_KEY);
}

#[test]
fn value_transfer_round_trips_through_flush() {
    let mut vm = genesis(&Config::default());
    vm.create_account(&bls(1), TokenAmount::from_atto(50)).unwrap();
    let mut msg = message(bls(1), bls(2), 0, METHOD_SEND, RawBytes::default());
    msg.value = TokenAmount::from_atto(20);
    let ret = vm.apply_message(&msg).unwrap();
    assert_eq!(ret.exit_code, ExitCode::Ok);
    assert!(ret.return_data.is_empty());

    let root = vm.flush().unwrap();
    assert_eq!(vm.flush().unwrap(), root);
    assert_eq!(
        vm.get_actor(&bls(2)).unwrap().unwrap().balance,
        TokenAmount::from_atto(20)
    );
}
