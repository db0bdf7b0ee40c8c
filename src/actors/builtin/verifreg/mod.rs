// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod v0;
pub mod v7;

use cid::Cid;
use num_bigint::BigInt;
use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::{ActorKind, load_state, make_empty_map, make_map_with_root, state_transaction};
use crate::actors::SYSTEM_ACTOR_ADDR;
use crate::db::Ipld;
use crate::invoker::MethodTable;
use crate::runtime::{
    ActorContext as _, ActorError, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _,
};
use crate::shim::address::Address;
use crate::shim::version::ActorVersion;
use crate::utils::encoding::{Cbor, bigint_ser, bigint_ser::BigIntDe};
use crate::{actor_error, method_table, versioned_state};

/// Data cap granted to verifiers and clients, in bytes.
pub type DataCap = BigInt;

/// Verified registry actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    AddVerifier = 2,
    RemoveVerifier = 3,
    AddVerifiedClient = 4,
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::VerifiedRegistry {
        V0(v0::State) => [V0, V2, V3, V4, V5, V6],
        V7(v7::State) => [V7],
    }
}

impl State {
    pub fn root_key(&self) -> Address {
        match self {
            State::V0(st) => st.root_key,
            State::V7(st) => st.root_key,
        }
    }

    pub fn verifier_cap<BS: Ipld>(
        &self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<Option<DataCap>, ActorError> {
        let root = match self {
            State::V0(st) => &st.verifiers,
            State::V7(st) => &st.verifiers,
        };
        get_cap(store, version, root, addr)
    }

    pub fn client_cap<BS: Ipld>(
        &self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<Option<DataCap>, ActorError> {
        let root = match self {
            State::V0(st) => &st.verified_clients,
            State::V7(st) => &st.verified_clients,
        };
        get_cap(store, version, root, addr)
    }

    pub fn put_verifier<BS: Ipld>(
        &mut self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
        cap: &DataCap,
    ) -> Result<(), ActorError> {
        put_cap(store, version, self.verifiers_mut(), addr, cap)
    }

    /// Removes a verifier, returning whether it was present.
    pub fn remove_verifier<BS: Ipld>(
        &mut self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
    ) -> Result<bool, ActorError> {
        let root = self.verifiers_mut();
        let mut map = make_map_with_root::<_, BigIntDe>(root, store, version)?;
        let removed = map.delete(&addr.to_bytes())?.is_some();
        *root = map.flush()?;
        Ok(removed)
    }

    pub fn put_client<BS: Ipld>(
        &mut self,
        store: BS,
        version: ActorVersion,
        addr: &Address,
        cap: &DataCap,
    ) -> Result<(), ActorError> {
        let root = match self {
            State::V0(st) => &mut st.verified_clients,
            State::V7(st) => &mut st.verified_clients,
        };
        put_cap(store, version, root, addr, cap)
    }

    fn verifiers_mut(&mut self) -> &mut Cid {
        match self {
            State::V0(st) => &mut st.verifiers,
            State::V7(st) => &mut st.verifiers,
        }
    }
}

fn get_cap<BS: Ipld>(
    store: BS,
    version: ActorVersion,
    root: &Cid,
    addr: &Address,
) -> Result<Option<DataCap>, ActorError> {
    let map = make_map_with_root::<_, BigIntDe>(root, store, version)?;
    Ok(map.get(&addr.to_bytes())?.map(|cap| cap.0.clone()))
}

fn put_cap<BS: Ipld>(
    store: BS,
    version: ActorVersion,
    root: &mut Cid,
    addr: &Address,
    cap: &DataCap,
) -> Result<(), ActorError> {
    let mut map = make_map_with_root::<_, BigIntDe>(root, store, version)?;
    map.set(addr.to_bytes().into(), BigIntDe(cap.clone()))?;
    *root = map.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct VerifierParams {
    pub address: Address,
    #[serde(with = "bigint_ser")]
    pub allowance: DataCap,
}

impl Cbor for VerifierParams {}

pub type AddVerifierParams = VerifierParams;
pub type AddVerifierClientParams = VerifierParams;

pub struct Actor;

impl Actor {
    /// Constructor for Registry Actor
    pub fn constructor(rt: &mut dyn Runtime, root_key: Address) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[SYSTEM_ACTOR_ADDR])?;

        // root should be an ID address
        let id_addr = rt.resolve_id(&root_key)?;

        let empty_map = make_empty_map::<_, BigIntDe>(rt.store())?;
        match rt.actor_version() {
            ActorVersion::V7 => rt.create(&v7::State::new(id_addr, empty_map)),
            _ => rt.create(&v0::State::new(id_addr, empty_map)),
        }
    }

    pub fn add_verifier(rt: &mut dyn Runtime, params: AddVerifierParams) -> Result<(), ActorError> {
        if params.allowance < BigInt::from(rt.policy().minimum_verified_deal_size) {
            return Err(actor_error!(
                illegal_argument,
                "Allowance {} below MinVerifiedDealSize for add verifier {}",
                params.allowance,
                params.address
            ));
        }

        let verifier = rt.resolve_id(&params.address)?;
        let version = rt.actor_version();

        let st: State = load_state(&*rt)?;
        rt.validate_immediate_caller_is(&[st.root_key()])?;

        if version >= ActorVersion::V2 {
            // Disallow root as a verifier.
            if verifier == st.root_key() {
                return Err(actor_error!(illegal_argument; "Rootkey cannot be added as verifier"));
            }
            // Disallow existing clients as verifiers.
            if st.client_cap(rt.store(), version, &verifier)?.is_some() {
                return Err(actor_error!(
                    illegal_argument,
                    "verified client {} cannot become a verifier",
                    verifier
                ));
            }
        }

        // Store the new verifier and allowance (over-writing).
        state_transaction(rt, |st: &mut State, rt| {
            st.put_verifier(rt.store(), version, &verifier, &params.allowance)
                .context("failed to add verifier")
        })
    }

    pub fn remove_verifier(rt: &mut dyn Runtime, verifier_addr: Address) -> Result<(), ActorError> {
        let verifier = rt.resolve_id(&verifier_addr)?;
        let version = rt.actor_version();

        let st: State = load_state(&*rt)?;
        rt.validate_immediate_caller_is(&[st.root_key()])?;

        state_transaction(rt, |st: &mut State, rt| {
            if st.remove_verifier(rt.store(), version, &verifier)? {
                Ok(())
            } else {
                Err(actor_error!(illegal_argument; "failed to remove verifier {}", verifier))
            }
        })
    }

    pub fn add_verified_client(
        rt: &mut dyn Runtime,
        params: AddVerifierClientParams,
    ) -> Result<(), ActorError> {
        // The caller will be verified by checking table below
        rt.validate_immediate_caller_accept_any()?;

        if params.allowance < BigInt::from(rt.policy().minimum_verified_deal_size) {
            return Err(actor_error!(
                illegal_argument,
                "Allowance {} below MinVerifiedDealSize for add verified client {}",
                params.allowance,
                params.address
            ));
        }

        let client = rt.resolve_id(&params.address)?;
        let version = rt.actor_version();

        let st: State = load_state(&*rt)?;
        if client == st.root_key() {
            return Err(actor_error!(
                illegal_argument,
                "Rootkey cannot be added as a verified client"
            ));
        }

        // Validate caller is one of the verifiers.
        let verifier = rt.message().caller;
        let verifier_cap = st
            .verifier_cap(rt.store(), version, &verifier)?
            .ok_or_else(|| actor_error!(not_found; "caller {} is not a verifier", verifier))?;

        // Disallow existing verifiers as clients.
        if st.verifier_cap(rt.store(), version, &client)?.is_some() {
            return Err(actor_error!(
                illegal_argument,
                "verifier {} cannot be added as a verified client",
                client
            ));
        }

        // Compute new verifier cap and update.
        if verifier_cap < params.allowance {
            return Err(actor_error!(
                illegal_argument,
                "Add more DataCap {} for VerifiedClient than allocated {}",
                params.allowance,
                verifier_cap
            ));
        }
        let new_verifier_cap = verifier_cap - &params.allowance;

        state_transaction(rt, |st: &mut State, rt| {
            st.put_verifier(rt.store(), version, &verifier, &new_verifier_cap)
                .context("failed to update verifier allowance")?;

            // This is a one-time, upfront allocation.
            // This allowance cannot be changed by calls to AddVerifiedClient as long as the
            // client has not been removed.
            if st.client_cap(rt.store(), version, &client)?.is_some() {
                return Err(actor_error!(
                    illegal_argument,
                    "verified client already exists: {}",
                    client
                ));
            }

            st.put_client(rt.store(), version, &client, &params.allowance)
                .context("failed to add verified client")
        })
    }
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    method_table!(ActorKind::VerifiedRegistry, version, Method {
        Constructor => Actor::constructor,
        AddVerifier => Actor::add_verifier,
        RemoveVerifier => Actor::remove_verifier,
        AddVerifiedClient => Actor::add_verified_client,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::VERIFIED_REGISTRY_ACTOR_ADDR;
    use crate::actors::builtin::testing::MockRuntime;
    use crate::actors::universal::Universal;
    use crate::shim::error::ExitCode;
    use crate::shim::version::NetworkVersion;
    use crate::utils::encoding::RawBytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const ROOT: Address = Address::new_id(101);
    const VERIFIER: Address = Address::new_id(201);
    const CLIENT: Address = Address::new_id(301);

    fn construct(nv: NetworkVersion) -> MockRuntime {
        let mut rt = MockRuntime::with_version(
            ActorKind::VerifiedRegistry,
            VERIFIED_REGISTRY_ACTOR_ADDR,
            nv,
        );
        rt.set_caller(ActorKind::System, SYSTEM_ACTOR_ADDR);
        rt.expect_validate_caller_addr(&[SYSTEM_ACTOR_ADDR]);
        rt.call(Method::Constructor as u64, &ROOT).unwrap();
        rt.verify();
        rt
    }

    fn state(rt: &MockRuntime) -> Universal<State> {
        Universal::load(rt.network_version, &rt.state, &rt.store).unwrap()
    }

    fn add_verifier(
        rt: &mut MockRuntime,
        verifier: Address,
        allowance: u64,
    ) -> Result<RawBytes, ActorError> {
        rt.set_caller(ActorKind::Account, ROOT);
        rt.expect_validate_caller_addr(&[ROOT]);
        rt.call(
            Method::AddVerifier as u64,
            &VerifierParams {
                address: verifier,
                allowance: allowance.into(),
            },
        )
    }

    fn add_client(
        rt: &mut MockRuntime,
        client: Address,
        allowance: u64,
    ) -> Result<RawBytes, ActorError> {
        rt.set_caller(ActorKind::Account, VERIFIER);
        rt.expect_validate_caller_any();
        rt.call(
            Method::AddVerifiedClient as u64,
            &VerifierParams {
                address: client,
                allowance: allowance.into(),
            },
        )
    }

    #[rstest]
    #[case(NetworkVersion::V3, false)]
    #[case(NetworkVersion::V14, false)]
    #[case(NetworkVersion::V15, true)]
    fn construct_layout(#[case] nv: NetworkVersion, #[case] has_removal_ids: bool) {
        let rt = construct(nv);
        let st = state(&rt);
        assert_eq!(st.root_key(), ROOT);
        assert_eq!(matches!(*st, State::V7(_)), has_removal_ids);
    }

    #[rstest]
    #[case::legacy_maps(NetworkVersion::V5)]
    #[case::current_maps(NetworkVersion::V15)]
    fn add_and_remove_verifier(#[case] nv: NetworkVersion) {
        let mut rt = construct(nv);
        let min = rt.policy.minimum_verified_deal_size;
        add_verifier(&mut rt, VERIFIER, min).unwrap();
        rt.verify();
        let st = state(&rt);
        assert_eq!(
            st.verifier_cap(&rt.store, rt.version, &VERIFIER).unwrap(),
            Some(DataCap::from(min))
        );

        rt.expect_validate_caller_addr(&[ROOT]);
        rt.call(Method::RemoveVerifier as u64, &VERIFIER).unwrap();
        rt.verify();
        let st = state(&rt);
        assert_eq!(st.verifier_cap(&rt.store, rt.version, &VERIFIER).unwrap(), None);

        rt.expect_validate_caller_addr(&[ROOT]);
        let err = rt.call(Method::RemoveVerifier as u64, &VERIFIER).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    }

    #[test]
    fn verifier_allowance_has_a_minimum() {
        let mut rt = construct(NetworkVersion::V15);
        let min = rt.policy.minimum_verified_deal_size;
        rt.set_caller(ActorKind::Account, ROOT);
        let err = rt
            .call(
                Method::AddVerifier as u64,
                &VerifierParams {
                    address: VERIFIER,
                    allowance: (min - 1).into(),
                },
            )
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    }

    #[test]
    fn only_root_adds_verifiers() {
        let mut rt = construct(NetworkVersion::V15);
        let min = rt.policy.minimum_verified_deal_size;
        rt.set_caller(ActorKind::Account, CLIENT);
        rt.expect_validate_caller_addr(&[ROOT]);
        let err = rt
            .call(
                Method::AddVerifier as u64,
                &VerifierParams {
                    address: VERIFIER,
                    allowance: min.into(),
                },
            )
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::SysErrForbidden);
    }

    #[test]
    fn root_cannot_be_verifier() {
        let mut rt = construct(NetworkVersion::V15);
        let min = rt.policy.minimum_verified_deal_size;
        let err = add_verifier(&mut rt, ROOT, min).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    }

    #[test]
    fn add_verified_client_spends_verifier_cap() {
        let mut rt = construct(NetworkVersion::V15);
        let min = rt.policy.minimum_verified_deal_size;
        add_verifier(&mut rt, VERIFIER, 3 * min).unwrap();

        add_client(&mut rt, CLIENT, min).unwrap();
        rt.verify();
        let st = state(&rt);
        assert_eq!(
            st.verifier_cap(&rt.store, rt.version, &VERIFIER).unwrap(),
            Some(DataCap::from(2 * min))
        );
        assert_eq!(
            st.client_cap(&rt.store, rt.version, &CLIENT).unwrap(),
            Some(DataCap::from(min))
        );

        // clients are granted once
        let err = add_client(&mut rt, CLIENT, min).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);

        // a client can not become a verifier
        let err = add_verifier(&mut rt, CLIENT, min).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    }

    #[test]
    fn add_verified_client_checks_cap() {
        let mut rt = construct(NetworkVersion::V15);
        let min = rt.policy.minimum_verified_deal_size;
        add_verifier(&mut rt, VERIFIER, min).unwrap();

        let err = add_client(&mut rt, CLIENT, min + 1).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);

        let err = add_client(&mut rt, VERIFIER, min).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    }

    #[test]
    fn unknown_verifier_is_not_found() {
        let mut rt = construct(NetworkVersion::V15);
        let min = rt.policy.minimum_verified_deal_size;
        let err = add_client(&mut rt, CLIENT, min).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrNotFound);
    }
}
