// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Builtin actor kinds, their code identifiers and versioned state.

pub mod builtin;
pub mod policy;
pub mod universal;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use cid::Cid;
use strum::IntoEnumIterator as _;

use crate::shim::ActorID;
use crate::shim::address::Address;
use crate::shim::version::{ActorVersion, VersionError};
use crate::utils::cid::identity_raw_cid;

pub const SYSTEM_ACTOR_ADDR: Address = Address::new_id(0);
pub const INIT_ACTOR_ADDR: Address = Address::new_id(1);
pub const REWARD_ACTOR_ADDR: Address = Address::new_id(2);
pub const CRON_ACTOR_ADDR: Address = Address::new_id(3);
pub const STORAGE_POWER_ACTOR_ADDR: Address = Address::new_id(4);
pub const STORAGE_MARKET_ACTOR_ADDR: Address = Address::new_id(5);
pub const VERIFIED_REGISTRY_ACTOR_ADDR: Address = Address::new_id(6);
/// Distinguished account actor that is the destination of all burnt funds.
pub const BURNT_FUNDS_ACTOR_ADDR: Address = Address::new_id(99);

/// First ID handed out by the Init actor.
pub const FIRST_NON_SINGLETON_ADDR: ActorID = 100;

/// Every kind of builtin actor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::EnumIter,
    strum::Display,
    strum::IntoStaticStr,
)]
pub enum ActorKind {
    #[strum(to_string = "system")]
    System,
    #[strum(to_string = "init")]
    Init,
    #[strum(to_string = "cron")]
    Cron,
    #[strum(to_string = "account")]
    Account,
    #[strum(to_string = "storagepower")]
    Power,
    #[strum(to_string = "storageminer")]
    Miner,
    #[strum(to_string = "storagemarket")]
    Market,
    #[strum(to_string = "paymentchannel")]
    PaymentChannel,
    #[strum(to_string = "multisig")]
    Multisig,
    #[strum(to_string = "reward")]
    Reward,
    #[strum(to_string = "verifiedregistry")]
    VerifiedRegistry,
}

impl ActorKind {
    /// Name used in the actor's code identifier.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Address of the only instance of a singleton actor.
    pub fn singleton_address(self) -> Option<Address> {
        match self {
            ActorKind::System => Some(SYSTEM_ACTOR_ADDR),
            ActorKind::Init => Some(INIT_ACTOR_ADDR),
            ActorKind::Reward => Some(REWARD_ACTOR_ADDR),
            ActorKind::Cron => Some(CRON_ACTOR_ADDR),
            ActorKind::Power => Some(STORAGE_POWER_ACTOR_ADDR),
            ActorKind::Market => Some(STORAGE_MARKET_ACTOR_ADDR),
            ActorKind::VerifiedRegistry => Some(VERIFIED_REGISTRY_ACTOR_ADDR),
            ActorKind::Account
            | ActorKind::Miner
            | ActorKind::PaymentChannel
            | ActorKind::Multisig => None,
        }
    }

    /// Actors that may sign messages and act as the origin of a message chain.
    pub fn is_principal(self) -> bool {
        matches!(self, ActorKind::Account | ActorKind::Multisig)
    }
}

/// Bidirectional map between builtin code identifiers and `(kind, version)` pairs.
struct BuiltinCodes {
    by_code: BTreeMap<Cid, (ActorKind, ActorVersion)>,
    by_kind: BTreeMap<(ActorKind, ActorVersion), Cid>,
}

static BUILTIN_CODES: LazyLock<BuiltinCodes> = LazyLock::new(|| {
    let mut by_code = BTreeMap::new();
    let mut by_kind = BTreeMap::new();
    for version in ActorVersion::iter() {
        for kind in ActorKind::iter() {
            let name = format!("fil/{}/{}", version.code_name_version(), kind.name());
            // identity digests are capped at 64 bytes, every builtin name fits
            if let Some(cid) = identity_raw_cid(&name) {
                by_code.insert(cid, (kind, version));
                by_kind.insert((kind, version), cid);
            }
        }
    }
    BuiltinCodes { by_code, by_kind }
});

/// Code identifier of `kind` at actor `version`.
pub fn builtin_code(kind: ActorKind, version: ActorVersion) -> Option<Cid> {
    BUILTIN_CODES.by_kind.get(&(kind, version)).copied()
}

/// Resolves a code identifier to the builtin actor it names.
pub fn lookup_code(code: &Cid) -> Result<(ActorKind, ActorVersion), VersionError> {
    BUILTIN_CODES
        .by_code
        .get(code)
        .copied()
        .ok_or(VersionError::UnknownActorCode(*code))
}

pub fn is_builtin_actor(code: &Cid) -> bool {
    BUILTIN_CODES.by_code.contains_key(code)
}

pub fn is_account_actor(code: &Cid) -> bool {
    matches!(lookup_code(code), Ok((ActorKind::Account, _)))
}

pub fn is_singleton_actor(code: &Cid) -> bool {
    lookup_code(code).is_ok_and(|(kind, _)| kind.singleton_address().is_some())
}

pub fn is_principal(code: &Cid) -> bool {
    lookup_code(code).is_ok_and(|(kind, _)| kind.is_principal())
}
