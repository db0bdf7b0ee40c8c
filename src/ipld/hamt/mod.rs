// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Hash array mapped trie over a content-addressed store.
//!
//! Nodes are encoded as `[bitfield, pointers]` where every pointer is either the CID of a
//! child node or a bucket of up to [`MAX_ARRAY_WIDTH`] `[key, value]` entries sorted by key.
//! Keys are hashed with SHA-256 and consumed [`DEFAULT_BIT_WIDTH`] bits per level. Maps
//! written before actors version 3 wrap each pointer in a single-entry map, see
//! [`HamtVersion`].

mod bitfield;
mod error;
mod hamt;
mod hash_bits;
mod node;
mod pointer;

pub use self::error::Error;
pub use self::hamt::Hamt;

use multihash_codetable::{Code, MultihashDigest};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::shim::version::{ActorVersion, StateTreeVersion};

/// Maximum number of entries held in a bucket before it is split into a child node.
pub const MAX_ARRAY_WIDTH: usize = 3;

/// Bits of the key hash consumed per level.
pub const DEFAULT_BIT_WIDTH: u32 = 5;

/// Pointer encoding of a map.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HamtVersion {
    /// Pointers are `{"0": link}` or `{"1": bucket}`.
    V0,
    /// Pointers are a bare link or bucket.
    #[default]
    V3,
}

impl From<ActorVersion> for HamtVersion {
    fn from(version: ActorVersion) -> Self {
        if version < ActorVersion::V3 {
            Self::V0
        } else {
            Self::V3
        }
    }
}

impl From<StateTreeVersion> for HamtVersion {
    fn from(version: StateTreeVersion) -> Self {
        match version {
            StateTreeVersion::V0 => Self::V0,
            _ => Self::V3,
        }
    }
}

type HashedKey = [u8; 32];

fn hash_key(key: &[u8]) -> HashedKey {
    let mut hashed = [0u8; 32];
    hashed.copy_from_slice(Code::Sha2_256.digest(key).digest());
    hashed
}

/// Raw bytes key of a HAMT entry.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Into,
)]
#[serde(transparent)]
pub struct BytesKey(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl Borrow<[u8]> for BytesKey {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for BytesKey {
    fn from(bz: &[u8]) -> Self {
        Self(bz.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct KeyValuePair<V>(BytesKey, V);

impl<V> KeyValuePair<V> {
    pub fn key(&self) -> &BytesKey {
        &self.0
    }

    pub fn value(&self) -> &V {
        &self.1
    }
}

/// Encodes an integer key the way actor maps do, as an unsigned varint.
pub fn u64_key(k: u64) -> BytesKey {
    let mut buf = unsigned_varint::encode::u64_buffer();
    BytesKey(unsigned_varint::encode::u64(k, &mut buf).to_vec())
}

/// Decodes an integer key written by [`u64_key`].
pub fn parse_u64_key(key: &[u8]) -> Result<u64, Error> {
    match unsigned_varint::decode::u64(key) {
        Ok((k, [])) => Ok(k),
        _ => Err(Error::InvalidKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_follows_actors_and_state_tree() {
        assert_eq!(HamtVersion::from(ActorVersion::V0), HamtVersion::V0);
        assert_eq!(HamtVersion::from(ActorVersion::V2), HamtVersion::V0);
        assert_eq!(HamtVersion::from(ActorVersion::V3), HamtVersion::V3);
        assert_eq!(HamtVersion::from(ActorVersion::V7), HamtVersion::V3);
        assert_eq!(HamtVersion::from(StateTreeVersion::V0), HamtVersion::V0);
        assert_eq!(HamtVersion::from(StateTreeVersion::V1), HamtVersion::V3);
    }
}
