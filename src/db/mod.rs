// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Content-addressed block storage.
//!
//! [`Ipld`] is the narrow key-value contract every store implements. Typed access goes
//! through [`IpldExt`], which is implemented for every store.

mod memory;
mod proxy;

pub use memory::MemoryDB;
pub use proxy::ProxyStore;

use cid::Cid;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

use crate::utils::cid::CidCborExt as _;
use crate::utils::encoding::{CodecError, from_slice, to_vec};

/// Store level failures. A missing block is reported distinctly from a store that could not
/// be read at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("block {0} not found")]
    NotFound(Cid),
    #[error("store I/O failure: {0}")]
    IoFailure(String),
}

/// Failure to load or store a typed object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpldError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Content addressed key-value store. Implementations only need read-your-writes semantics.
pub trait Ipld {
    /// Returns `Ok(true)` if a block is stored under `cid`.
    fn contains(&self, cid: &Cid) -> Result<bool, StoreError>;

    /// Reads the block stored under `cid`, failing with [`StoreError::NotFound`] if absent.
    fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError>;

    /// Stores `bytes` under `cid`.
    fn set(&self, cid: Cid, bytes: Vec<u8>) -> Result<(), StoreError>;
}

impl<T: Ipld + ?Sized> Ipld for &T {
    fn contains(&self, cid: &Cid) -> Result<bool, StoreError> {
        (**self).contains(cid)
    }

    fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        (**self).get(cid)
    }

    fn set(&self, cid: Cid, bytes: Vec<u8>) -> Result<(), StoreError> {
        (**self).set(cid, bytes)
    }
}

impl<T: Ipld + ?Sized> Ipld for Arc<T> {
    fn contains(&self, cid: &Cid) -> Result<bool, StoreError> {
        (**self).contains(cid)
    }

    fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        (**self).get(cid)
    }

    fn set(&self, cid: Cid, bytes: Vec<u8>) -> Result<(), StoreError> {
        (**self).set(cid, bytes)
    }
}

/// Extension trait for the [`Ipld`] trait. It is implemented for all stores and provides
/// typed, `dag-cbor` encoded access.
pub trait IpldExt {
    /// Reads and decodes the object stored under `cid`.
    fn get_cbor<T: DeserializeOwned>(&self, cid: &Cid) -> Result<T, IpldError>;

    /// Same as [`IpldExt::get_cbor`], but a missing block is `Ok(None)`.
    fn get_cbor_opt<T: DeserializeOwned>(&self, cid: &Cid) -> Result<Option<T>, IpldError>;

    /// Encodes `obj`, stores it and returns its CID.
    fn put_cbor<T: Serialize + ?Sized>(&self, obj: &T) -> Result<Cid, IpldError>;
}

impl<S: Ipld + ?Sized> IpldExt for S {
    fn get_cbor<T: DeserializeOwned>(&self, cid: &Cid) -> Result<T, IpldError> {
        Ok(from_slice(&self.get(cid)?)?)
    }

    fn get_cbor_opt<T: DeserializeOwned>(&self, cid: &Cid) -> Result<Option<T>, IpldError> {
        match self.get(cid) {
            Ok(bytes) => Ok(Some(from_slice(&bytes)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_cbor<T: Serialize + ?Sized>(&self, obj: &T) -> Result<Cid, IpldError> {
        let bytes = to_vec(obj)?;
        let cid = Cid::from_cbor_bytes(&bytes);
        self.set(cid, bytes)?;
        Ok(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_round_trip() {
        let db = MemoryDB::default();
        let cid = db.put_cbor(&(7u64, "seven")).unwrap();
        assert!(db.contains(&cid).unwrap());
        let (n, s): (u64, String) = db.get_cbor(&cid).unwrap();
        assert_eq!((n, s.as_str()), (7, "seven"));
    }

    #[test]
    fn missing_block() {
        let db = MemoryDB::default();
        let cid = Cid::from_cbor_blake2b256(&1u8).unwrap();
        assert!(!db.contains(&cid).unwrap());
        assert_eq!(db.get(&cid), Err(StoreError::NotFound(cid)));
        assert_eq!(db.get_cbor_opt::<u8>(&cid), Ok(None));
        assert!(matches!(
            db.get_cbor::<u8>(&cid),
            Err(IpldError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn works_through_trait_objects() {
        let db = Arc::new(MemoryDB::default());
        let store: &dyn Ipld = db.as_ref();
        let cid = store.put_cbor(&[1u8, 2, 3]).unwrap();
        assert_eq!(db.get_cbor::<Vec<u8>>(&cid).unwrap(), vec![1, 2, 3]);
    }
}
