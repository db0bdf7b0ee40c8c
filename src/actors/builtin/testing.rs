// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Scripted runtime for exercising actor methods in isolation.

use std::collections::VecDeque;

use ahash::HashMap;
use cid::Cid;
use serde::de::DeserializeOwned;

use crate::actors::policy::Policy;
use crate::actors::{ActorKind, builtin_code, lookup_code};
use crate::db::{Ipld, IpldExt as _, MemoryDB};
use crate::invoker::Invoker;
use crate::runtime::{ActorError, MessageInfo, Runtime};
use crate::shim::MethodNum;
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::error::ExitCode;
use crate::shim::version::{ActorVersion, NetworkVersion};
use crate::utils::cid::EMPTY_ARR_CID;
use crate::utils::encoding::{Cbor, RawBytes};

#[derive(Clone, Debug)]
pub struct ExpectCreateActor {
    pub code_id: Cid,
    pub address: Address,
}

#[derive(Clone, Debug)]
pub struct ExpectedMessage {
    pub to: Address,
    pub method: MethodNum,
    pub params: RawBytes,
    pub value: TokenAmount,

    // returns from applying expectedMessage
    pub send_return: RawBytes,
    pub exit_code: ExitCode,
}

pub struct MockRuntime {
    pub epoch: ChainEpoch,
    pub network_version: NetworkVersion,
    pub version: ActorVersion,
    pub policy: Policy,
    pub kind: ActorKind,
    pub message: MessageInfo,
    pub id_addresses: HashMap<Address, Address>,
    pub actor_code_cids: HashMap<Address, Cid>,
    pub new_actor_addr: Option<Address>,

    // Actor State
    pub state: Cid,
    pub balance: TokenAmount,
    pub store: MemoryDB,

    // Expectations
    pub expect_validate_caller_any: bool,
    pub expect_validate_caller_addr: Option<Vec<Address>>,
    pub expect_validate_caller_type: Option<Vec<ActorKind>>,
    pub expect_sends: VecDeque<ExpectedMessage>,
    pub expect_create_actor: Option<ExpectCreateActor>,
}

impl MockRuntime {
    pub fn new(kind: ActorKind, receiver: Address) -> Self {
        Self::with_version(kind, receiver, NetworkVersion::V15)
    }

    pub fn with_version(kind: ActorKind, receiver: Address, nv: NetworkVersion) -> Self {
        let version = ActorVersion::try_from(nv).unwrap();
        let mut actor_code_cids = HashMap::default();
        actor_code_cids.insert(receiver, builtin_code(kind, version).unwrap());
        Self {
            epoch: 0,
            network_version: nv,
            version,
            policy: Policy::default(),
            kind,
            message: MessageInfo {
                caller: Address::new_id(0),
                receiver,
                value_received: TokenAmount::zero(),
            },
            id_addresses: HashMap::default(),
            actor_code_cids,
            new_actor_addr: None,
            state: *EMPTY_ARR_CID,
            balance: TokenAmount::zero(),
            store: MemoryDB::default(),
            expect_validate_caller_any: false,
            expect_validate_caller_addr: None,
            expect_validate_caller_type: None,
            expect_sends: VecDeque::new(),
            expect_create_actor: None,
        }
    }

    pub fn set_caller(&mut self, kind: ActorKind, addr: Address) {
        self.message.caller = addr;
        self.actor_code_cids
            .insert(addr, builtin_code(kind, self.version).unwrap());
    }

    pub fn set_actor(&mut self, kind: ActorKind, addr: Address) {
        self.actor_code_cids
            .insert(addr, builtin_code(kind, self.version).unwrap());
    }

    pub fn set_value(&mut self, value: TokenAmount) {
        self.balance += value.clone();
        self.message.value_received = value;
    }

    pub fn add_id_address(&mut self, source: Address, target: Address) {
        self.id_addresses.insert(source, target);
    }

    pub fn get_state<T: DeserializeOwned>(&self) -> T {
        self.store.get_cbor(&self.state).unwrap()
    }

    pub fn expect_validate_caller_any(&mut self) {
        self.expect_validate_caller_any = true;
    }

    pub fn expect_validate_caller_addr(&mut self, addrs: &[Address]) {
        assert!(!addrs.is_empty(), "addrs must be non-empty");
        self.expect_validate_caller_addr = Some(addrs.to_vec());
    }

    pub fn expect_validate_caller_type(&mut self, types: &[ActorKind]) {
        assert!(!types.is_empty(), "types must be non-empty");
        self.expect_validate_caller_type = Some(types.to_vec());
    }

    pub fn expect_send(
        &mut self,
        to: Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
        send_return: RawBytes,
        exit_code: ExitCode,
    ) {
        self.expect_sends.push_back(ExpectedMessage {
            to,
            method,
            params,
            value,
            send_return,
            exit_code,
        })
    }

    pub fn expect_create_actor(&mut self, code_id: Cid, address: Address) {
        self.expect_create_actor = Some(ExpectCreateActor { code_id, address });
    }

    /// Invokes `method` on the receiver through the builtin method tables.
    pub fn call<P: Cbor>(&mut self, method: MethodNum, params: &P) -> Result<RawBytes, ActorError> {
        let params = RawBytes::serialize(params).unwrap();
        let code = builtin_code(self.kind, self.version).unwrap();
        Invoker::builtin().invoke(self, &code, method, &params)
    }

    pub fn verify(&mut self) {
        assert!(
            !self.expect_validate_caller_any,
            "expected ValidateCallerAny, not received"
        );
        assert!(
            self.expect_validate_caller_addr.is_none(),
            "expected ValidateCallerAddr {:?}, not received",
            self.expect_validate_caller_addr
        );
        assert!(
            self.expect_validate_caller_type.is_none(),
            "expected ValidateCallerType {:?}, not received",
            self.expect_validate_caller_type
        );
        assert!(
            self.expect_sends.is_empty(),
            "expected all messages to be sent, unsent messages {:?}",
            self.expect_sends
        );
        assert!(
            self.expect_create_actor.is_none(),
            "expected actor to be created, uncreated actor: {:?}",
            self.expect_create_actor
        );
    }

    fn caller_kind(&self) -> Option<ActorKind> {
        let code = self.actor_code_cids.get(&self.message.caller)?;
        lookup_code(code).ok().map(|(kind, _)| kind)
    }
}

impl Runtime for MockRuntime {
    fn message(&self) -> &MessageInfo {
        &self.message
    }

    fn curr_epoch(&self) -> ChainEpoch {
        self.epoch
    }

    fn network_version(&self) -> NetworkVersion {
        self.network_version
    }

    fn actor_version(&self) -> ActorVersion {
        self.version
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn validate_immediate_caller_accept_any(&mut self) -> Result<(), ActorError> {
        assert!(
            self.expect_validate_caller_any,
            "unexpected validate-caller-any"
        );
        self.expect_validate_caller_any = false;
        Ok(())
    }

    fn validate_immediate_caller_is(&mut self, addresses: &[Address]) -> Result<(), ActorError> {
        let expected = self
            .expect_validate_caller_addr
            .take()
            .expect("unexpected validate caller addrs");
        assert_eq!(expected, addresses, "unexpected validate caller addrs");
        if addresses.contains(&self.message.caller) {
            Ok(())
        } else {
            Err(ActorError::unchecked(
                ExitCode::SysErrForbidden,
                format!(
                    "caller address {} forbidden, allowed: {:?}",
                    self.message.caller, addresses
                ),
            ))
        }
    }

    fn validate_immediate_caller_type(&mut self, types: &[ActorKind]) -> Result<(), ActorError> {
        let expected = self
            .expect_validate_caller_type
            .take()
            .expect("unexpected validate caller code");
        assert_eq!(expected, types, "unexpected validate caller code");
        match self.caller_kind() {
            Some(kind) if types.contains(&kind) => Ok(()),
            found => Err(ActorError::unchecked(
                ExitCode::SysErrForbidden,
                format!("caller type {found:?} forbidden, allowed: {types:?}"),
            )),
        }
    }

    fn current_balance(&self) -> Result<TokenAmount, ActorError> {
        Ok(self.balance.clone())
    }

    fn resolve_address(&self, address: &Address) -> Result<Option<Address>, ActorError> {
        if address.id().is_ok() {
            return Ok(Some(*address));
        }
        Ok(self.id_addresses.get(address).copied())
    }

    fn get_actor_code_cid(&self, addr: &Address) -> Result<Option<Cid>, ActorError> {
        Ok(self.actor_code_cids.get(addr).copied())
    }

    fn store(&self) -> &dyn Ipld {
        &self.store
    }

    fn state_root(&self) -> Result<Cid, ActorError> {
        Ok(self.state)
    }

    fn set_state_root(&mut self, root: &Cid) -> Result<(), ActorError> {
        self.state = *root;
        Ok(())
    }

    fn send(
        &mut self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<RawBytes, ActorError> {
        let expected = self
            .expect_sends
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected message to {to} method {method}"));
        assert_eq!(
            (expected.to, expected.method, &expected.params, &expected.value),
            (*to, method, &params, &value),
            "message does not match expectation"
        );
        if value > self.balance {
            return Err(ActorError::unchecked(
                ExitCode::SysErrInsufficientFunds,
                format!("cannot send {value} from balance {}", self.balance),
            ));
        }
        self.balance -= value;
        if expected.exit_code.is_success() {
            Ok(expected.send_return)
        } else {
            Err(ActorError::unchecked(
                expected.exit_code,
                "expected failure".to_string(),
            ))
        }
    }

    fn new_actor_address(&mut self) -> Result<Address, ActorError> {
        Ok(self.new_actor_addr.expect("no new actor address set"))
    }

    fn create_actor(&mut self, code_id: Cid, address: &Address) -> Result<(), ActorError> {
        let expected = self
            .expect_create_actor
            .take()
            .expect("unexpected call to create actor");
        assert_eq!(
            (expected.code_id, expected.address),
            (code_id, *address),
            "unexpected actor being created"
        );
        self.actor_code_cids.insert(*address, code_id);
        Ok(())
    }

    fn charge_gas(&mut self, _name: &'static str, _compute: i64) -> Result<(), ActorError> {
        Ok(())
    }
}
