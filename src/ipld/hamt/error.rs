// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

use crate::db::{IpldError, StoreError};
use crate::utils::encoding::CodecError;

/// HAMT Error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Maximum depth error
    #[error("Maximum depth reached")]
    MaxDepth,
    /// Hash bits does not support greater than 8 bit width
    #[error("HashBits does not support retrieving more than 8 bits")]
    InvalidHashBitLen,
    /// A child node broke the canonical form invariants
    #[error("Invalid HAMT node: {0}")]
    InvalidNode(&'static str),
    /// An integer key could not be decoded
    #[error("Invalid HAMT key")]
    InvalidKey,
    #[error(transparent)]
    Ipld(#[from] IpldError),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Ipld(e.into())
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Ipld(e.into())
    }
}
