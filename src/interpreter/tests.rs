// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::actors::builtin::{init, multisig, system};
use crate::actors::universal::Universal;
use crate::actors::{ActorKind, FIRST_NON_SINGLETON_ADDR};
use crate::db::MemoryDB;
use crate::runtime::METHOD_SEND;
use crate::utils::encoding::to_vec;

const ROOT: Address = Address::new_id(80);

fn bls(n: u8) -> Address {
    Address::new_bls(&[n; 48]).unwrap()
}

fn setup() -> Vm<MemoryDB> {
    Vm::genesis(MemoryDB::default(), &Config::default(), &ROOT).unwrap()
}

fn transfer(from: Address, to: Address, sequence: u64, value: u64) -> Message {
    Message {
        from,
        to,
        sequence,
        value: TokenAmount::from_atto(value),
        method_num: METHOD_SEND,
        params: RawBytes::default(),
        gas_limit: 10_000_000,
    }
}

fn init_state<S: Ipld>(vm: &Vm<S>) -> init::State {
    let actor = vm.get_actor(&INIT_ACTOR_ADDR).unwrap().unwrap();
    Universal::<init::State>::load_actor(vm.state_tree().store(), &actor)
        .unwrap()
        .into_inner()
}

#[test]
fn genesis_installs_singletons() {
    let vm = setup();
    for (kind, addr) in [
        (ActorKind::System, SYSTEM_ACTOR_ADDR),
        (ActorKind::Init, INIT_ACTOR_ADDR),
        (ActorKind::Reward, REWARD_ACTOR_ADDR),
        (ActorKind::Cron, CRON_ACTOR_ADDR),
        (ActorKind::Power, STORAGE_POWER_ACTOR_ADDR),
        (ActorKind::Market, STORAGE_MARKET_ACTOR_ADDR),
        (ActorKind::VerifiedRegistry, VERIFIED_REGISTRY_ACTOR_ADDR),
        (ActorKind::Account, BURNT_FUNDS_ACTOR_ADDR),
    ] {
        let actor = vm.get_actor(&addr).unwrap().unwrap();
        assert_eq!(actor.code, vm.code(kind).unwrap(), "{kind}");
        match kind {
            // the empty system state encodes exactly like the placeholder head
            ActorKind::System => {
                Universal::<system::State>::load_actor(vm.state_tree().store(), &actor).unwrap();
            }
            ActorKind::Account => {}
            _ => assert_ne!(actor.state, *EMPTY_ARR_CID, "{kind} was not constructed"),
        }
    }
    let init = init_state(&vm);
    assert_eq!(init.network_name(), "mainnet");
    assert_eq!(init.next_id(), FIRST_NON_SINGLETON_ADDR);
}

#[test]
fn genesis_at_old_network_version() {
    let config = Config {
        network_version: NetworkVersion::V3,
        ..Default::default()
    };
    let vm = Vm::genesis(MemoryDB::default(), &config, &ROOT).unwrap();
    assert_eq!(vm.actor_version(), ActorVersion::V0);
    let power = vm.get_actor(&STORAGE_POWER_ACTOR_ADDR).unwrap().unwrap();
    assert_eq!(power.code, builtin_code(ActorKind::Power, ActorVersion::V0).unwrap());
}

#[test]
fn transfer_to_new_key_address_creates_account() {
    let mut vm = setup();
    let alice = vm.create_account(&bls(1), TokenAmount::from_atto(1000)).unwrap();
    assert_eq!(alice, Address::new_id(FIRST_NON_SINGLETON_ADDR));

    let ret = vm.apply_message(&transfer(bls(1), bls(2), 0, 400)).unwrap();
    assert_eq!(ret.exit_code, ExitCode::Ok, "{:?}", ret.failure_info);
    assert!(ret.gas_used > 0);

    let bob = vm.state_tree().lookup_id(&bls(2)).unwrap().unwrap();
    let bob_actor = vm.get_actor(&bob).unwrap().unwrap();
    assert!(is_account_actor(&bob_actor.code));
    assert_eq!(bob_actor.balance, TokenAmount::from_atto(400));

    let alice_actor = vm.get_actor(&alice).unwrap().unwrap();
    assert_eq!(alice_actor.balance, TokenAmount::from_atto(600));
    assert_eq!(alice_actor.sequence, 1);
    assert_eq!(vm.resolve_to_key_addr(&bob).unwrap(), bls(2));
}

#[test]
fn insufficient_funds_reverts_receiver_creation() {
    let mut vm = setup();
    vm.create_account(&bls(1), TokenAmount::from_atto(10)).unwrap();

    let ret = vm.apply_message(&transfer(bls(1), bls(2), 0, 11)).unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrInsufficientFunds);
    assert_eq!(vm.state_tree().lookup_id(&bls(2)).unwrap(), None);
    // the sequence is still consumed
    assert_eq!(vm.get_actor(&bls(1)).unwrap().unwrap().sequence, 1);
}

#[test]
fn sender_checks() {
    let mut vm = setup();
    vm.create_account(&bls(1), TokenAmount::from_atto(10)).unwrap();

    let ret = vm.apply_message(&transfer(bls(1), bls(2), 5, 1)).unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrSenderStateInvalid);
    let ret = vm.apply_message(&transfer(bls(9), bls(2), 0, 1)).unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrSenderInvalid);
    let ret = vm.apply_message(&transfer(INIT_ACTOR_ADDR, bls(2), 0, 0)).unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrSenderInvalid);
}

#[test]
fn missing_id_receiver() {
    let mut vm = setup();
    vm.create_account(&bls(1), TokenAmount::from_atto(10)).unwrap();
    let ret = vm
        .apply_message(&transfer(bls(1), Address::new_id(5000), 0, 1))
        .unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrInvalidReceiver);
}

#[test]
fn out_of_gas() {
    let mut vm = setup();
    vm.create_account(&bls(1), TokenAmount::from_atto(10)).unwrap();
    let msg = Message {
        gas_limit: 100,
        ..transfer(bls(1), bls(2), 0, 1)
    };
    let ret = vm.apply_message(&msg).unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrOutOfGas);
    assert_eq!(ret.gas_used, 100);
    assert_eq!(vm.state_tree().lookup_id(&bls(2)).unwrap(), None);
}

#[test]
fn unknown_method() {
    let mut vm = setup();
    let ret = vm
        .apply_implicit_message(&Message::implicit(CRON_ACTOR_ADDR, 99, RawBytes::default()))
        .unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrInvalidMethod);
}

#[test]
fn constructors_only_accept_the_system_actor() {
    let mut vm = setup();
    vm.create_account(&bls(1), TokenAmount::from_atto(10)).unwrap();
    let msg = Message {
        method_num: METHOD_CONSTRUCTOR,
        ..transfer(bls(1), SYSTEM_ACTOR_ADDR, 0, 0)
    };
    let ret = vm.apply_message(&msg).unwrap();
    assert_eq!(ret.exit_code, ExitCode::SysErrForbidden);
}

fn exec_multisig(signers: Vec<Address>, threshold: u64) -> Message {
    let ctor = multisig::ConstructorParams {
        signers,
        num_approvals_threshold: threshold,
        unlock_duration: 0,
        start_epoch: 0,
    };
    let params = init::ExecParams {
        code_cid: builtin_code(ActorKind::Multisig, ActorVersion::V7).unwrap(),
        constructor_params: RawBytes::serialize(&ctor).unwrap(),
    };
    Message {
        method_num: init::Method::Exec as MethodNum,
        params: RawBytes::serialize(&params).unwrap(),
        ..transfer(bls(1), INIT_ACTOR_ADDR, 0, 5)
    }
}

#[test]
fn init_exec_creates_multisig() {
    let mut vm = setup();
    let alice = vm.create_account(&bls(1), TokenAmount::from_atto(10)).unwrap();
    vm.create_account(&bls(2), TokenAmount::zero()).unwrap();

    let ret = vm.apply_message(&exec_multisig(vec![bls(1), bls(2)], 2)).unwrap();
    assert_eq!(ret.exit_code, ExitCode::Ok, "{:?}", ret.failure_info);
    let created: init::ExecReturn = ret.return_data.deserialize().unwrap();
    assert_eq!(created.id_address, Address::new_id(FIRST_NON_SINGLETON_ADDR + 2));

    // robust address derived from the origin key, its sequence and the creation count
    let mut seed = to_vec(&bls(1)).unwrap();
    seed.extend_from_slice(&0u64.to_be_bytes());
    seed.extend_from_slice(&0u64.to_be_bytes());
    assert_eq!(created.robust_address, Address::new_actor(&seed));
    assert_eq!(
        vm.state_tree().lookup_id(&created.robust_address).unwrap(),
        Some(created.id_address)
    );

    let actor = vm.get_actor(&created.id_address).unwrap().unwrap();
    assert_eq!(actor.balance, TokenAmount::from_atto(5));
    let st = Universal::<multisig::State>::load_actor(vm.state_tree().store(), &actor).unwrap();
    assert_eq!(st.signers(), [alice, Address::new_id(FIRST_NON_SINGLETON_ADDR + 1)]);
    assert_eq!(st.threshold(), 2);
}

#[test]
fn failed_constructor_reverts_exec() {
    let mut vm = setup();
    vm.create_account(&bls(1), TokenAmount::from_atto(10)).unwrap();
    let next_id = init_state(&vm).next_id();

    let ret = vm.apply_message(&exec_multisig(vec![bls(1)], 3)).unwrap();
    assert_eq!(ret.exit_code, ExitCode::ErrIllegalArgument);
    assert!(ret.failure_info.unwrap().contains("constructor failed"));

    assert_eq!(init_state(&vm).next_id(), next_id);
    assert_eq!(vm.get_actor(&Address::new_id(next_id)).unwrap(), None);
    assert_eq!(
        vm.get_actor(&bls(1)).unwrap().unwrap().balance,
        TokenAmount::from_atto(10)
    );
}

#[test]
fn flush_and_reload() {
    let store = Arc::new(MemoryDB::default());
    let mut vm = Vm::genesis(Arc::clone(&store), &Config::default(), &ROOT).unwrap();
    let alice = vm.create_account(&bls(1), TokenAmount::from_atto(77)).unwrap();
    let root = vm.flush().unwrap();

    let vm = Vm::load(store, &root, NetworkVersion::V15, Policy::default()).unwrap();
    assert_eq!(
        vm.get_actor(&bls(1)).unwrap().unwrap().balance,
        TokenAmount::from_atto(77)
    );
    assert_eq!(vm.state_tree().lookup_id(&bls(1)).unwrap(), Some(alice));
    assert_eq!(init_state(&vm).next_id(), FIRST_NON_SINGLETON_ADDR + 1);
}

#[test]
fn accounts_are_created_once() {
    let mut vm = setup();
    let id = vm.create_account(&bls(1), TokenAmount::from_atto(1)).unwrap();
    let err = vm.create_account(&bls(1), TokenAmount::from_atto(1)).unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    assert_eq!(err.msg(), format!("{} already has actor {id}", bls(1)));
    assert!(vm.create_account(&ROOT, TokenAmount::zero()).is_err());
}
