// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Canonical `dag-cbor` encoding of on-chain structures.
//!
//! Structs are encoded as fixed-order arrays of their fields (see [`serde_tuple`]) and
//! embedded links use CBOR tag 42. Decode failures are classified into a [`CodecErrorKind`]
//! so the invoker can turn them into a precise exit code.

pub mod bigint_ser;
mod raw_bytes;

pub use self::raw_bytes::RawBytes;

use cid::Cid;
use serde::{Serialize, de::DeserializeOwned};
use serde_ipld_dagcbor::DecodeError;
use std::convert::Infallible;
use std::fmt;
use thiserror::Error;

use crate::utils::cid::CidCborExt as _;

/// `dag-cbor` multicodec.
pub const DAG_CBOR: u64 = 0x71;
/// Raw bytes multicodec.
pub const IPLD_RAW: u64 = 0x55;

const INTEGER_TYPES: [&str; 8] = ["u8", "u16", "u32", "u64", "i8", "i16", "i32", "i64"];

/// Distinguishes why a value could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum CodecErrorKind {
    /// A byte string, array or map had the wrong number of bytes or entries, or the
    /// input ended early.
    WrongLength,
    /// The major type found does not match the type expected.
    WrongType,
    /// An integer or string did not name a known variant.
    WrongEnum,
    /// A number does not fit into the target type.
    OutOfRange,
    /// A tuple encoded struct had a different number of fields.
    WrongParamCount,
    /// Encoding failed, the value cannot be represented.
    Encode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {description}")]
pub struct CodecError {
    kind: CodecErrorKind,
    description: String,
}

impl CodecError {
    pub fn new(kind: CodecErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn kind(&self) -> CodecErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Classifies a `dag-cbor` decode failure of `input`.
    fn from_decode(err: DecodeError<Infallible>, input: &[u8]) -> Self {
        let kind = match &err {
            DecodeError::Msg(msg) => return Self::classify(msg),
            DecodeError::Read(never) => match *never {},
            // the header had the right major type but a wider argument than the target allows
            DecodeError::Mismatch { expect_major, byte } if byte >> 5 == *expect_major => {
                CodecErrorKind::OutOfRange
            }
            DecodeError::Mismatch { .. }
            | DecodeError::TypeMismatch { .. }
            | DecodeError::InvalidUtf8(_)
            | DecodeError::Unsupported { .. }
            | DecodeError::RequireBorrowed { .. }
            | DecodeError::DepthLimit => CodecErrorKind::WrongType,
            DecodeError::CastOverflow(_) | DecodeError::Overflow { .. } => {
                CodecErrorKind::OutOfRange
            }
            DecodeError::RequireLength { .. } => CodecErrorKind::WrongParamCount,
            DecodeError::TrailingData | DecodeError::IndefiniteSize => CodecErrorKind::WrongLength,
            // Array and map headers are read without checking the major type, so a complete
            // item of another type also runs out of input.
            DecodeError::Eof if is_complete_item(input) => CodecErrorKind::WrongType,
            DecodeError::Eof => CodecErrorKind::WrongLength,
        };
        Self::new(kind, err.to_string())
    }

    /// Classifies a decoder error by the standard `serde` messages it carries.
    pub fn classify(err: impl fmt::Display) -> Self {
        let description = err.to_string();
        let lower = description.to_ascii_lowercase();
        let kind = if lower.contains("invalid type") {
            CodecErrorKind::WrongType
        } else if lower.contains("invalid length") {
            if lower.contains("tuple") || lower.contains("struct") || lower.contains("element")
            {
                CodecErrorKind::WrongParamCount
            } else {
                CodecErrorKind::WrongLength
            }
        } else if lower.contains("invalid value") {
            if INTEGER_TYPES
                .iter()
                .any(|ty| lower.ends_with(&format!("expected {ty}")))
            {
                CodecErrorKind::OutOfRange
            } else {
                CodecErrorKind::WrongEnum
            }
        } else if lower.contains("unknown variant") {
            CodecErrorKind::WrongEnum
        } else if lower.contains("overflow") || lower.contains("out of range") {
            CodecErrorKind::OutOfRange
        } else if lower.contains("eof")
            || lower.contains("trailing")
            || lower.contains("length")
            || lower.contains("end of")
        {
            CodecErrorKind::WrongLength
        } else {
            CodecErrorKind::WrongType
        };
        Self { kind, description }
    }
}

/// Whether `input` holds exactly one well formed `dag-cbor` item.
fn is_complete_item(input: &[u8]) -> bool {
    serde_ipld_dagcbor::from_slice::<ipld_core::ipld::Ipld>(input).is_ok()
}

/// Serializes a value to canonical `dag-cbor` bytes.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>, CodecError>
where
    T: Serialize + ?Sized,
{
    serde_ipld_dagcbor::to_vec(value)
        .map_err(|e| CodecError::new(CodecErrorKind::Encode, e.to_string()))
}

/// Deserializes a value from `dag-cbor` bytes, rejecting trailing data.
pub fn from_slice<T>(bz: &[u8]) -> Result<T, CodecError>
where
    T: DeserializeOwned,
{
    serde_ipld_dagcbor::from_slice(bz).map_err(|e| CodecError::from_decode(e, bz))
}

/// Cbor utility functions for serializable objects
pub trait Cbor: Serialize + DeserializeOwned {
    /// Marshalls cbor encodable object into cbor bytes
    fn marshal_cbor(&self) -> Result<Vec<u8>, CodecError> {
        to_vec(self)
    }

    /// Unmarshals cbor encoded bytes to object
    fn unmarshal_cbor(bz: &[u8]) -> Result<Self, CodecError> {
        from_slice(bz)
    }

    /// Returns the content identifier of the raw block of data
    /// Default is Blake2b256 hash
    fn cid(&self) -> Result<Cid, CodecError> {
        Ok(Cid::from_cbor_bytes(&self.marshal_cbor()?))
    }
}

/// Methods that take no parameters accept only empty input, and methods that return nothing
/// produce empty output.
impl Cbor for () {
    fn marshal_cbor(&self) -> Result<Vec<u8>, CodecError> {
        Ok(Vec::new())
    }

    fn unmarshal_cbor(bz: &[u8]) -> Result<Self, CodecError> {
        if bz.is_empty() {
            Ok(())
        } else {
            Err(CodecError::new(
                CodecErrorKind::WrongParamCount,
                format!("expected no parameters, got {} bytes", bz.len()),
            ))
        }
    }
}

/// Byte string wrapper for use inside collections, where a field level `serde(with)` can not
/// reach the elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BytesDe(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl Cbor for crate::shim::address::Address {}
impl Cbor for crate::shim::econ::TokenAmount {}

/// Generates a digest of variable length using the blake2b algorithm.
pub fn blake2b_variable(ingest: &[u8], size: usize) -> Vec<u8> {
    blake2b_simd::Params::new()
        .hash_length(size)
        .to_state()
        .update(ingest)
        .finalize()
        .as_bytes()
        .to_vec()
}

/// Generates a 32 byte blake2b digest.
pub fn blake2b_256(ingest: &[u8]) -> [u8; 32] {
    let digest = blake2b_simd::Params::new()
        .hash_length(32)
        .to_state()
        .update(ingest)
        .finalize();

    let mut ret = [0u8; 32];
    ret.clone_from_slice(digest.as_bytes());
    ret
}
