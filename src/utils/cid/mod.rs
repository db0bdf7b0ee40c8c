// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use cid::multihash::Multihash;
use multihash_codetable::{Code, MultihashDigest};
use serde::Serialize;
use std::sync::LazyLock;

use crate::utils::encoding::{CodecError, DAG_CBOR, IPLD_RAW, to_vec};

/// Identity multihash code, the digest is the input itself.
pub const IDENTITY_HASH: u64 = 0x0;

/// Encoding of an empty CBOR array.
pub const EMPTY_ARR_BYTES: [u8; 1] = [0x80];

/// CID of the empty CBOR array. Freshly created actors carry it as their head until their
/// constructor stores a state object.
pub static EMPTY_ARR_CID: LazyLock<Cid> =
    LazyLock::new(|| Cid::from_cbor_bytes(&EMPTY_ARR_BYTES));

/// Extension methods for constructing `dag-cbor` [Cid]
pub trait CidCborExt {
    /// Default CID builder for Filecoin
    ///
    /// - The default codec is [`DAG_CBOR`]
    /// - The default hash function is 256 bit BLAKE2b
    fn from_cbor_blake2b256<S: Serialize + ?Sized>(obj: &S) -> Result<Cid, CodecError> {
        Ok(Self::from_cbor_bytes(&to_vec(obj)?))
    }

    /// Builds the [`DAG_CBOR`] CID of bytes that are already encoded.
    fn from_cbor_bytes(bytes: &[u8]) -> Cid {
        Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(bytes))
    }
}

impl CidCborExt for Cid {}

/// Builds a raw codec CID whose identity multihash carries `name`. Builtin actor code
/// identifiers are constructed this way.
pub fn identity_raw_cid(name: &str) -> Option<Cid> {
    let mh = Multihash::<64>::wrap(IDENTITY_HASH, name.as_bytes()).ok()?;
    Some(Cid::new_v1(IPLD_RAW, mh))
}
