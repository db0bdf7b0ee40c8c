// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

use super::{Cbor, CodecError};

/// Already serialized method parameters or return value.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Into,
    derive_more::Deref,
)]
#[serde(transparent)]
pub struct RawBytes {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
}

impl RawBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encodes a value with its [`Cbor`] implementation.
    pub fn serialize<T: Cbor>(obj: &T) -> Result<Self, CodecError> {
        Ok(Self::new(obj.marshal_cbor()?))
    }

    /// Decodes the bytes with the [`Cbor`] implementation of `T`.
    pub fn deserialize<T: Cbor>(&self) -> Result<T, CodecError> {
        T::unmarshal_cbor(&self.bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}
