// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod v0;

use std::collections::BTreeSet;

use serde_tuple::{Deserialize_tuple, Serialize_tuple};

use super::{ActorKind, make_empty_map};
use crate::actors::INIT_ACTOR_ADDR;
use crate::invoker::MethodTable;
use crate::runtime::{
    ActorContext as _, ActorError, METHOD_CONSTRUCTOR, Runtime, RuntimeExt as _,
};
use crate::shim::address::Address;
use crate::shim::clock::ChainEpoch;
use crate::shim::econ::TokenAmount;
use crate::shim::version::ActorVersion;
use crate::utils::encoding::Cbor;
use crate::{actor_error, method_table, versioned_state};

/// Maximum number of signers a multisig may have, from actors v2 on.
pub const SIGNERS_MAX: usize = 256;

/// Multisig actor methods available
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    AddSigner = 5,
    RemoveSigner = 6,
}

versioned_state! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum State for ActorKind::Multisig {
        V0(v0::State) => [V0, V2, V3, V4, V5, V6, V7],
    }
}

impl State {
    pub fn signers(&self) -> &[Address] {
        match self {
            State::V0(st) => &st.signers,
        }
    }

    pub fn threshold(&self) -> u64 {
        match self {
            State::V0(st) => st.num_approvals_threshold,
        }
    }

    pub fn initial_balance(&self) -> &TokenAmount {
        match self {
            State::V0(st) => &st.initial_balance,
        }
    }
}

/// Constructor parameters for multisig actor at actors v0, where vesting starts at the
/// creation epoch.
#[derive(Debug, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct ConstructorParamsV0 {
    pub signers: Vec<Address>,
    pub num_approvals_threshold: u64,
    pub unlock_duration: ChainEpoch,
}

impl Cbor for ConstructorParamsV0 {}

/// Constructor parameters for multisig actor
#[derive(Debug, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct ConstructorParams {
    pub signers: Vec<Address>,
    pub num_approvals_threshold: u64,
    pub unlock_duration: ChainEpoch,
    // * Added in v2
    pub start_epoch: ChainEpoch,
}

impl Cbor for ConstructorParams {}

/// Add signer params
#[derive(Debug, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct AddSignerParams {
    pub signer: Address,
    pub increase: bool,
}

impl Cbor for AddSignerParams {}

/// Remove signer params
#[derive(Debug, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct RemoveSignerParams {
    pub signer: Address,
    pub decrease: bool,
}

impl Cbor for RemoveSignerParams {}

/// Multisig Actor
pub struct Actor;

impl Actor {
    pub fn constructor_v0(
        rt: &mut dyn Runtime,
        params: ConstructorParamsV0,
    ) -> Result<(), ActorError> {
        let start_epoch = rt.curr_epoch();
        Self::constructor(
            rt,
            ConstructorParams {
                signers: params.signers,
                num_approvals_threshold: params.num_approvals_threshold,
                unlock_duration: params.unlock_duration,
                start_epoch,
            },
        )
    }

    /// Constructor for Multisig actor
    pub fn constructor(rt: &mut dyn Runtime, params: ConstructorParams) -> Result<(), ActorError> {
        rt.validate_immediate_caller_is(&[INIT_ACTOR_ADDR])?;

        if params.signers.is_empty() {
            return Err(actor_error!(illegal_argument; "Must have at least one signer"));
        }

        if has_signer_limit(rt.actor_version()) && params.signers.len() > SIGNERS_MAX {
            return Err(actor_error!(
                illegal_argument,
                "cannot add more than {} signers",
                SIGNERS_MAX
            ));
        }

        // resolve signer addresses and do not allow duplicate signers
        let mut resolved_signers = Vec::with_capacity(params.signers.len());
        let mut dedup_signers = BTreeSet::new();
        for signer in &params.signers {
            let resolved = rt.resolve_id(signer)?;
            if !dedup_signers.insert(resolved) {
                return Err(
                    actor_error!(illegal_argument; "duplicate signer not allowed: {}", signer),
                );
            }
            resolved_signers.push(resolved);
        }

        if params.num_approvals_threshold > resolved_signers.len() as u64 {
            return Err(
                actor_error!(illegal_argument; "must not require more approvals than signers"),
            );
        }

        if params.num_approvals_threshold < 1 {
            return Err(actor_error!(illegal_argument; "must require at least one approval"));
        }

        if params.unlock_duration < 0 {
            return Err(actor_error!(illegal_argument; "negative unlock duration disallowed"));
        }

        let empty_root = make_empty_map::<_, v0::Transaction>(rt.store())?;

        let mut st = v0::State {
            signers: resolved_signers,
            num_approvals_threshold: params.num_approvals_threshold,
            next_tx_id: v0::TxnID::default(),
            initial_balance: TokenAmount::zero(),
            start_epoch: 0,
            unlock_duration: 0,
            pending_txs: empty_root,
        };

        if params.unlock_duration != 0 {
            st.set_locked(
                params.start_epoch,
                params.unlock_duration,
                rt.message().value_received.clone(),
            );
        }
        rt.create(&st)
    }

    /// Multisig actor function to add signers to multisig
    pub fn add_signer(rt: &mut dyn Runtime, params: AddSignerParams) -> Result<(), ActorError> {
        let receiver = rt.message().receiver;
        rt.validate_immediate_caller_is(&[receiver])?;
        let resolved_new_signer = rt.resolve_id(&params.signer)?;
        let limited = has_signer_limit(rt.actor_version());

        rt.transaction(|st: &mut v0::State, _| {
            if limited && st.signers.len() >= SIGNERS_MAX {
                return Err(actor_error!(
                    forbidden,
                    "cannot add more than {} signers",
                    SIGNERS_MAX
                ));
            }
            if st.is_signer(&resolved_new_signer) {
                return Err(actor_error!(
                    forbidden,
                    "{} is already a signer",
                    resolved_new_signer
                ));
            }

            // Add signer and increase threshold if set
            st.signers.push(resolved_new_signer);
            if params.increase {
                st.num_approvals_threshold += 1;
            }

            Ok(())
        })
    }

    /// Multisig actor function to remove signers to multisig
    pub fn remove_signer(
        rt: &mut dyn Runtime,
        params: RemoveSignerParams,
    ) -> Result<(), ActorError> {
        let receiver = rt.message().receiver;
        rt.validate_immediate_caller_is(&[receiver])?;
        let resolved_old_signer = rt.resolve_id(&params.signer)?;
        // pending approvals of removed signers are only cleared from v2 on
        let purge = rt.actor_version() >= ActorVersion::V2;

        rt.transaction(|st: &mut v0::State, rt| {
            if !st.is_signer(&resolved_old_signer) {
                return Err(actor_error!(
                    forbidden,
                    "{} is not a signer",
                    resolved_old_signer
                ));
            }

            if st.signers.len() == 1 {
                return Err(actor_error!(forbidden; "Cannot remove only signer"));
            }

            if !params.decrease && ((st.signers.len() - 1) as u64) < st.num_approvals_threshold {
                return Err(actor_error!(
                    illegal_argument,
                    "can't reduce signers to {} below threshold {} with decrease=false",
                    st.signers.len() - 1,
                    st.num_approvals_threshold
                ));
            }

            if params.decrease {
                if st.num_approvals_threshold < 2 {
                    return Err(actor_error!(
                        illegal_argument,
                        "can't decrease approvals from {} to {}",
                        st.num_approvals_threshold,
                        st.num_approvals_threshold.saturating_sub(1)
                    ));
                }
                st.num_approvals_threshold -= 1;
            }

            if purge {
                st.purge_approvals(rt.store(), rt.actor_version(), &resolved_old_signer)
                    .context("failed to purge approvals of removed signer")?;
            }
            st.signers.retain(|s| s != &resolved_old_signer);

            Ok(())
        })
    }
}

fn has_signer_limit(version: ActorVersion) -> bool {
    version >= ActorVersion::V2
}

pub fn method_table(version: ActorVersion) -> MethodTable {
    match version {
        ActorVersion::V0 => method_table!(ActorKind::Multisig, version, Method {
            Constructor => Actor::constructor_v0,
            AddSigner => Actor::add_signer,
            RemoveSigner => Actor::remove_signer,
        }),
        _ => method_table!(ActorKind::Multisig, version, Method {
            Constructor => Actor::constructor,
            AddSigner => Actor::add_signer,
            RemoveSigner => Actor::remove_signer,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::builtin::make_map_with_root;
    use crate::actors::builtin::testing::MockRuntime;
    use crate::db::IpldExt as _;
    use crate::shim::error::ExitCode;
    use crate::shim::version::NetworkVersion;
    use crate::utils::encoding::RawBytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const MSIG: Address = Address::new_id(1000);
    const ANNE: Address = Address::new_id(101);
    const BOB: Address = Address::new_id(102);
    const CHARLIE: Address = Address::new_id(103);

    fn runtime(nv: NetworkVersion) -> MockRuntime {
        let mut rt = MockRuntime::with_version(ActorKind::Multisig, MSIG, nv);
        rt.set_caller(ActorKind::Init, INIT_ACTOR_ADDR);
        rt
    }

    fn construct(rt: &mut MockRuntime, signers: Vec<Address>, threshold: u64) {
        rt.expect_validate_caller_addr(&[INIT_ACTOR_ADDR]);
        rt.call(
            Method::Constructor as u64,
            &ConstructorParams {
                signers,
                num_approvals_threshold: threshold,
                unlock_duration: 0,
                start_epoch: 0,
            },
        )
        .unwrap();
        rt.verify();
        rt.set_caller(ActorKind::Multisig, MSIG);
    }

    fn remove_signer(
        rt: &mut MockRuntime,
        signer: Address,
        decrease: bool,
    ) -> Result<RawBytes, ActorError> {
        rt.expect_validate_caller_addr(&[MSIG]);
        rt.call(
            Method::RemoveSigner as u64,
            &RemoveSignerParams { signer, decrease },
        )
    }

    #[test]
    fn construct_resolves_signers() {
        let mut rt = runtime(NetworkVersion::V15);
        let robust = Address::new_actor(b"bob");
        rt.add_id_address(robust, BOB);
        rt.set_value(TokenAmount::from_atto(100));
        rt.expect_validate_caller_addr(&[INIT_ACTOR_ADDR]);
        rt.call(
            Method::Constructor as u64,
            &ConstructorParams {
                signers: vec![ANNE, robust],
                num_approvals_threshold: 2,
                unlock_duration: 10,
                start_epoch: 5,
            },
        )
        .unwrap();
        rt.verify();

        let st: v0::State = rt.get_state();
        assert_eq!(st.signers, vec![ANNE, BOB]);
        assert_eq!(st.num_approvals_threshold, 2);
        assert_eq!(st.initial_balance, TokenAmount::from_atto(100));
        assert_eq!((st.start_epoch, st.unlock_duration), (5, 10));
    }

    #[test]
    fn v0_vesting_starts_at_creation() {
        let mut rt = runtime(NetworkVersion::V3);
        rt.epoch = 42;
        rt.set_value(TokenAmount::from_atto(7));
        rt.expect_validate_caller_addr(&[INIT_ACTOR_ADDR]);
        rt.call(
            Method::Constructor as u64,
            &ConstructorParamsV0 {
                signers: vec![ANNE],
                num_approvals_threshold: 1,
                unlock_duration: 100,
            },
        )
        .unwrap();
        rt.verify();

        let st: v0::State = rt.get_state();
        assert_eq!(st.start_epoch, 42);
        assert_eq!(st.unlock_duration, 100);
    }

    #[test]
    fn construct_rejects_bad_thresholds() {
        for (signers, threshold) in [(vec![ANNE], 2), (vec![ANNE], 0), (vec![], 1)] {
            let mut rt = runtime(NetworkVersion::V15);
            rt.expect_validate_caller_addr(&[INIT_ACTOR_ADDR]);
            let err = rt
                .call(
                    Method::Constructor as u64,
                    &ConstructorParams {
                        signers,
                        num_approvals_threshold: threshold,
                        unlock_duration: 0,
                        start_epoch: 0,
                    },
                )
                .unwrap_err();
            assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
        }
    }

    #[test]
    fn construct_rejects_duplicate_signers() {
        let mut rt = runtime(NetworkVersion::V15);
        let robust = Address::new_actor(b"anne");
        rt.add_id_address(robust, ANNE);
        rt.expect_validate_caller_addr(&[INIT_ACTOR_ADDR]);
        let err = rt
            .call(
                Method::Constructor as u64,
                &ConstructorParams {
                    signers: vec![ANNE, robust],
                    num_approvals_threshold: 1,
                    unlock_duration: 0,
                    start_epoch: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);
    }

    #[test]
    fn add_signer_and_increase_threshold() {
        let mut rt = runtime(NetworkVersion::V15);
        construct(&mut rt, vec![ANNE, BOB], 1);

        rt.expect_validate_caller_addr(&[MSIG]);
        rt.call(
            Method::AddSigner as u64,
            &AddSignerParams {
                signer: CHARLIE,
                increase: true,
            },
        )
        .unwrap();
        rt.verify();
        let st: v0::State = rt.get_state();
        assert_eq!(st.signers, vec![ANNE, BOB, CHARLIE]);
        assert_eq!(st.num_approvals_threshold, 2);

        rt.expect_validate_caller_addr(&[MSIG]);
        let err = rt
            .call(
                Method::AddSigner as u64,
                &AddSignerParams {
                    signer: BOB,
                    increase: false,
                },
            )
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrForbidden);
    }

    #[test]
    fn only_self_may_change_signers() {
        let mut rt = runtime(NetworkVersion::V15);
        construct(&mut rt, vec![ANNE], 1);
        rt.set_caller(ActorKind::Account, ANNE);
        rt.expect_validate_caller_addr(&[MSIG]);
        let err = rt
            .call(
                Method::AddSigner as u64,
                &AddSignerParams {
                    signer: BOB,
                    increase: false,
                },
            )
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::SysErrForbidden);
    }

    #[test]
    fn remove_signer_checks_threshold() {
        let mut rt = runtime(NetworkVersion::V15);
        construct(&mut rt, vec![ANNE, BOB], 2);

        let err = remove_signer(&mut rt, BOB, false).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrIllegalArgument);

        remove_signer(&mut rt, BOB, true).unwrap();
        let st: v0::State = rt.get_state();
        assert_eq!(st.signers, vec![ANNE]);
        assert_eq!(st.num_approvals_threshold, 1);

        let err = remove_signer(&mut rt, ANNE, false).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrForbidden);
        let err = remove_signer(&mut rt, CHARLIE, false).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ErrForbidden);
    }

    #[rstest]
    #[case::legacy_maps(NetworkVersion::V4)]
    #[case::current_maps(NetworkVersion::V15)]
    fn remove_signer_purges_approvals(#[case] nv: NetworkVersion) {
        let mut rt = runtime(nv);
        construct(&mut rt, vec![ANNE, BOB], 1);

        // seed two pending transactions approved by bob
        let mut st: v0::State = rt.get_state();
        let mut txns =
            make_map_with_root::<_, v0::Transaction>(&st.pending_txs, &rt.store, rt.version)
                .unwrap();
        for (id, approved) in [(0u8, vec![BOB]), (1, vec![ANNE, BOB])] {
            let txn = v0::Transaction {
                to: CHARLIE,
                value: TokenAmount::zero(),
                method: 0,
                params: RawBytes::default(),
                approved,
            };
            txns.set(vec![id].into(), txn).unwrap();
        }
        st.pending_txs = txns.flush().unwrap();
        rt.state = rt.store.put_cbor(&st).unwrap();

        remove_signer(&mut rt, BOB, false).unwrap();
        let st: v0::State = rt.get_state();
        let txns =
            make_map_with_root::<_, v0::Transaction>(&st.pending_txs, &rt.store, rt.version)
                .unwrap();
        let entries = txns.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.approved, vec![ANNE]);
    }

    #[test]
    fn universal_accessors() {
        let mut rt = runtime(NetworkVersion::V12);
        construct(&mut rt, vec![ANNE, BOB], 2);
        let st = crate::actors::universal::Universal::<State>::load(
            NetworkVersion::V12,
            &rt.state,
            &rt.store,
        )
        .unwrap();
        assert_eq!(st.signers(), &[ANNE, BOB]);
        assert_eq!(st.threshold(), 2);
        assert!(st.initial_balance().is_zero());
    }
}
