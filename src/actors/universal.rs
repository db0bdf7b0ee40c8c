// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Version polymorphic actor state.
//!
//! Each actor kind declares its state as a closed enum over the concrete layouts it has had
//! on chain, together with the actor versions each layout is used by. Versions sharing a
//! layout share a variant. [`Universal`] pairs such an enum with the version it was loaded
//! at, so accessors can match on the variant while callers never name a concrete layout.

use std::ops::Deref;

use cid::Cid;
use thiserror::Error;

use crate::actors::{ActorKind, lookup_code};
use crate::db::{Ipld, IpldError, StoreError};
use crate::shim::version::{ActorVersion, NetworkVersion, VersionError};
use crate::state_tree::ActorState;
use crate::utils::cid::CidCborExt as _;
use crate::utils::encoding::CodecError;

/// State of one actor kind across all actor versions.
pub trait VersionedState: Sized {
    /// The actor kind this state belongs to.
    const KIND: ActorKind;

    /// Decodes `bytes` with the layout `version` uses.
    fn decode(version: ActorVersion, bytes: &[u8]) -> Result<Self, CodecError>;

    /// Canonical encoding of the concrete layout.
    fn encode(&self) -> Result<Vec<u8>, CodecError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("expected {expected} actor state, found {found} actor")]
    WrongKind {
        expected: ActorKind,
        found: ActorKind,
    },
}

impl From<IpldError> for LoadError {
    fn from(e: IpldError) -> Self {
        match e {
            IpldError::Store(e) => e.into(),
            IpldError::Codec(e) => e.into(),
        }
    }
}

/// Declares the versioned state enum of an actor kind.
///
/// Every actor version must be listed exactly once; a missing version is a compile error.
///
/// ```ignore
/// versioned_state! {
///     pub enum State for ActorKind::Reward {
///         V0(v0::State) => [V0],
///         V2(v2::State) => [V2, V3, V4, V5, V6, V7],
///     }
/// }
/// ```
#[macro_export]
macro_rules! versioned_state {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident for $kind:path {
            $($variant:ident($ty:ty) => [$($version:ident),+ $(,)?]),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(::serde::Serialize)]
        #[serde(untagged)]
        $vis enum $name {
            $($variant($ty),)+
        }

        impl $crate::actors::universal::VersionedState for $name {
            const KIND: $crate::actors::ActorKind = $kind;

            fn decode(
                version: $crate::shim::version::ActorVersion,
                bytes: &[u8],
            ) -> ::std::result::Result<Self, $crate::utils::encoding::CodecError> {
                match version {
                    $(
                        $($crate::shim::version::ActorVersion::$version)|+ => {
                            Ok($name::$variant($crate::utils::encoding::from_slice(bytes)?))
                        }
                    )+
                }
            }

            fn encode(
                &self,
            ) -> ::std::result::Result<Vec<u8>, $crate::utils::encoding::CodecError> {
                match self {
                    $($name::$variant(st) => $crate::utils::encoding::to_vec(st),)+
                }
            }
        }
    };
}

/// Handle on actor state loaded at a fixed actor version. The concrete layout never changes
/// for the lifetime of the handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Universal<S> {
    version: ActorVersion,
    state: S,
}

impl<S: VersionedState> Universal<S> {
    /// Loads the state stored under `cid` with the layout used at network version `nv`.
    pub fn load<BS: Ipld + ?Sized>(
        nv: NetworkVersion,
        cid: &Cid,
        store: &BS,
    ) -> Result<Self, LoadError> {
        Self::load_at(ActorVersion::try_from(nv)?, cid, store)
    }

    /// Loads the state stored under `cid` with the layout of actor `version`.
    pub fn load_at<BS: Ipld + ?Sized>(
        version: ActorVersion,
        cid: &Cid,
        store: &BS,
    ) -> Result<Self, LoadError> {
        let bytes = store.get(cid)?;
        Self::decode(version, &bytes)
    }

    /// Loads the head of `actor`, picking the layout from its code.
    pub fn load_actor<BS: Ipld + ?Sized>(
        store: &BS,
        actor: &ActorState,
    ) -> Result<Self, LoadError> {
        let (kind, version) = lookup_code(&actor.code)?;
        if kind != S::KIND {
            return Err(LoadError::WrongKind {
                expected: S::KIND,
                found: kind,
            });
        }
        Self::load_at(version, &actor.state, store)
    }

    pub fn decode(version: ActorVersion, bytes: &[u8]) -> Result<Self, LoadError> {
        Ok(Self {
            version,
            state: S::decode(version, bytes)?,
        })
    }

    /// Actor version the state was loaded at.
    pub fn version(&self) -> ActorVersion {
        self.version
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        self.state.encode()
    }

    /// Stores the state and returns its CID.
    pub fn commit<BS: Ipld + ?Sized>(&self, store: &BS) -> Result<Cid, IpldError> {
        let bytes = self.to_cbor()?;
        let cid = Cid::from_cbor_bytes(&bytes);
        store.set(cid, bytes)?;
        Ok(cid)
    }

    pub fn into_inner(self) -> S {
        self.state
    }
}

impl<S> Deref for Universal<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::builtin_code;
    use crate::db::{IpldExt as _, MemoryDB};
    use crate::shim::econ::TokenAmount;
    use crate::utils::encoding::CodecErrorKind;
    use crate::versioned_state;
    use pretty_assertions::assert_eq;
    use serde_tuple::{Deserialize_tuple, Serialize_tuple};

    #[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
    struct Before {
        count: u64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
    struct After {
        count: u64,
        label: String,
    }

    versioned_state! {
        #[derive(Debug, Clone, PartialEq)]
        enum Counter for ActorKind::Cron {
            Before(Before) => [V0, V2],
            After(After) => [V3, V4, V5, V6, V7],
        }
    }

    impl Counter {
        fn count(&self) -> u64 {
            match self {
                Counter::Before(st) => st.count,
                Counter::After(st) => st.count,
            }
        }
    }

    #[test]
    fn picks_layout_by_network_version() {
        let store = MemoryDB::default();
        let old = store.put_cbor(&Before { count: 4 }).unwrap();
        let new = store
            .put_cbor(&After {
                count: 5,
                label: "x".into(),
            })
            .unwrap();

        let st = Universal::<Counter>::load(NetworkVersion::V3, &old, &store).unwrap();
        assert_eq!(st.version(), ActorVersion::V0);
        assert_eq!(st.count(), 4);
        let st = Universal::<Counter>::load(NetworkVersion::V10, &new, &store).unwrap();
        assert!(matches!(*st, Counter::After(_)));
        assert_eq!(st.count(), 5);
    }

    #[test]
    fn aliased_versions_encode_identically() {
        let store = MemoryDB::default();
        let cid = store.put_cbor(&Before { count: 9 }).unwrap();
        let a = Universal::<Counter>::load(NetworkVersion::V3, &cid, &store).unwrap();
        let b = Universal::<Counter>::load(NetworkVersion::V4, &cid, &store).unwrap();
        assert_eq!(a.to_cbor().unwrap(), b.to_cbor().unwrap());
        assert_eq!(a.to_cbor().unwrap(), store.get(&cid).unwrap());
        assert_eq!(a.commit(&store).unwrap(), cid);
    }

    #[test]
    fn layout_mismatch_is_codec_error() {
        let store = MemoryDB::default();
        let cid = store.put_cbor(&Before { count: 1 }).unwrap();
        let err = Universal::<Counter>::load(NetworkVersion::V12, &cid, &store).unwrap_err();
        assert!(
            matches!(err, LoadError::Codec(ref e) if e.kind() == CodecErrorKind::WrongParamCount)
        );
    }

    #[test]
    fn unknown_network_version() {
        let store = MemoryDB::default();
        let cid = store.put_cbor(&Before { count: 1 }).unwrap();
        let nv = NetworkVersion::from(99);
        assert_eq!(
            Universal::<Counter>::load(nv, &cid, &store),
            Err(LoadError::Version(VersionError::UnknownNetworkVersion(nv)))
        );
    }

    #[test]
    fn load_actor_checks_kind() {
        let store = MemoryDB::default();
        let head = store.put_cbor(&Before { count: 2 }).unwrap();
        let actor = ActorState::new(
            builtin_code(ActorKind::Cron, ActorVersion::V2).unwrap(),
            head,
            TokenAmount::zero(),
            0,
        );
        let st = Universal::<Counter>::load_actor(&store, &actor).unwrap();
        assert_eq!(st.version(), ActorVersion::V2);
        assert_eq!(st.into_inner().count(), 2);

        let actor = ActorState::new(
            builtin_code(ActorKind::Account, ActorVersion::V2).unwrap(),
            head,
            TokenAmount::zero(),
            0,
        );
        assert_eq!(
            Universal::<Counter>::load_actor(&store, &actor),
            Err(LoadError::WrongKind {
                expected: ActorKind::Cron,
                found: ActorKind::Account,
            })
        );
    }
}
