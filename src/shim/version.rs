// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

/// Specifies the network version
///
/// # Examples
/// ```
/// # use forest_actor_vm::shim::version::{ActorVersion, NetworkVersion};
/// let nv = NetworkVersion::V10;
/// assert_eq!(u32::from(nv), 10);
/// assert_eq!(ActorVersion::try_from(nv).unwrap(), ActorVersion::V3);
/// ```
#[derive(
    Debug,
    Eq,
    PartialEq,
    Clone,
    Copy,
    Hash,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct NetworkVersion(u32);

/// Defines public constants V0, V1, ... for [`NetworkVersion`].
macro_rules! define_network_versions {
    ($($version:literal),+ $(,)?) => {
        impl NetworkVersion {
            $(
                pastey::paste! {
                    pub const [<V $version>]: Self = Self($version);
                }
            )+
        }
    }
}

define_network_versions!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15);

impl NetworkVersion {
    /// Newest network version this crate carries actor code for.
    pub const LATEST: Self = Self::V15;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("unknown network version {0}")]
    UnknownNetworkVersion(NetworkVersion),
    #[error("unknown actor code {0}")]
    UnknownActorCode(Cid),
}

/// Builtin actor code version. Versions 1 was never deployed, so `V0` is followed by `V2`.
#[derive(
    Debug,
    Eq,
    PartialEq,
    Clone,
    Copy,
    Hash,
    Ord,
    PartialOrd,
    Serialize_repr,
    Deserialize_repr,
    strum::EnumIter,
    strum::Display,
)]
#[repr(u8)]
pub enum ActorVersion {
    #[strum(to_string = "v0")]
    V0 = 0,
    #[strum(to_string = "v2")]
    V2 = 2,
    #[strum(to_string = "v3")]
    V3 = 3,
    #[strum(to_string = "v4")]
    V4 = 4,
    #[strum(to_string = "v5")]
    V5 = 5,
    #[strum(to_string = "v6")]
    V6 = 6,
    #[strum(to_string = "v7")]
    V7 = 7,
}

impl ActorVersion {
    /// Version number embedded in builtin code names. `V0` actors are named `fil/1/...`.
    pub fn code_name_version(self) -> u8 {
        match self {
            ActorVersion::V0 => 1,
            v => v as u8,
        }
    }
}

impl TryFrom<NetworkVersion> for ActorVersion {
    type Error = VersionError;

    fn try_from(nv: NetworkVersion) -> Result<Self, Self::Error> {
        Ok(match nv.0 {
            0..=3 => ActorVersion::V0,
            4..=9 => ActorVersion::V2,
            10..=11 => ActorVersion::V3,
            12 => ActorVersion::V4,
            13 => ActorVersion::V5,
            14 => ActorVersion::V6,
            15 => ActorVersion::V7,
            _ => return Err(VersionError::UnknownNetworkVersion(nv)),
        })
    }
}

/// Layout of the state tree root.
#[derive(
    Debug, Eq, PartialEq, Clone, Copy, Hash, Ord, PartialOrd, Serialize_repr, Deserialize_repr,
)]
#[repr(u64)]
pub enum StateTreeVersion {
    /// Bare actors HAMT root, no wrapper.
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
    V4 = 4,
}

impl TryFrom<NetworkVersion> for StateTreeVersion {
    type Error = VersionError;

    fn try_from(nv: NetworkVersion) -> Result<Self, Self::Error> {
        Ok(match nv.0 {
            0..=9 => StateTreeVersion::V0,
            10..=11 => StateTreeVersion::V1,
            12 => StateTreeVersion::V2,
            13 => StateTreeVersion::V3,
            14..=15 => StateTreeVersion::V4,
            _ => return Err(VersionError::UnknownNetworkVersion(nv)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NetworkVersion::V0, ActorVersion::V0)]
    #[case(NetworkVersion::V3, ActorVersion::V0)]
    #[case(NetworkVersion::V4, ActorVersion::V2)]
    #[case(NetworkVersion::V9, ActorVersion::V2)]
    #[case(NetworkVersion::V10, ActorVersion::V3)]
    #[case(NetworkVersion::V11, ActorVersion::V3)]
    #[case(NetworkVersion::V12, ActorVersion::V4)]
    #[case(NetworkVersion::V13, ActorVersion::V5)]
    #[case(NetworkVersion::V14, ActorVersion::V6)]
    #[case(NetworkVersion::V15, ActorVersion::V7)]
    fn network_to_actor_version(#[case] nv: NetworkVersion, #[case] expected: ActorVersion) {
        assert_eq!(ActorVersion::try_from(nv).unwrap(), expected);
    }

    #[rstest]
    #[case(NetworkVersion::V9, StateTreeVersion::V0)]
    #[case(NetworkVersion::V10, StateTreeVersion::V1)]
    #[case(NetworkVersion::V12, StateTreeVersion::V2)]
    #[case(NetworkVersion::V13, StateTreeVersion::V3)]
    #[case(NetworkVersion::V15, StateTreeVersion::V4)]
    fn network_to_state_tree_version(
        #[case] nv: NetworkVersion,
        #[case] expected: StateTreeVersion,
    ) {
        assert_eq!(StateTreeVersion::try_from(nv).unwrap(), expected);
    }

    #[test]
    fn unknown_network_version() {
        let nv = NetworkVersion::from(16);
        assert_eq!(
            ActorVersion::try_from(nv),
            Err(VersionError::UnknownNetworkVersion(nv))
        );
        assert!(StateTreeVersion::try_from(nv).is_err());
    }

    #[test]
    fn code_name_versions() {
        assert_eq!(ActorVersion::V0.code_name_version(), 1);
        assert_eq!(ActorVersion::V7.code_name_version(), 7);
        assert_eq!(ActorVersion::V3.to_string(), "v3");
    }
}
