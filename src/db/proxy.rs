// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use tracing::trace;

use super::{Ipld, StoreError};

/// Wrapper around an [`Ipld`] store that forwards every operation unchanged. Operations are
/// traced under the given scope name, so a store can be handed to a component while its
/// block traffic stays attributable.
#[derive(Debug)]
pub struct ProxyStore<S> {
    inner: S,
    scope: &'static str,
}

impl<S: Ipld> ProxyStore<S> {
    pub fn new(inner: S, scope: &'static str) -> Self {
        Self { inner, scope }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Ipld> Ipld for ProxyStore<S> {
    fn contains(&self, cid: &Cid) -> Result<bool, StoreError> {
        let res = self.inner.contains(cid);
        trace!(scope = self.scope, %cid, ?res, "contains");
        res
    }

    fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        let res = self.inner.get(cid);
        trace!(scope = self.scope, %cid, ok = res.is_ok(), "get");
        res
    }

    fn set(&self, cid: Cid, bytes: Vec<u8>) -> Result<(), StoreError> {
        trace!(scope = self.scope, %cid, len = bytes.len(), "set");
        self.inner.set(cid, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{IpldExt, MemoryDB};

    #[test]
    fn forwards_all_operations() {
        let mem = MemoryDB::default();
        let proxy = ProxyStore::new(&mem, "test");

        let cid = proxy.put_cbor(&"hello").unwrap();
        assert!(mem.contains(&cid).unwrap());
        assert!(proxy.contains(&cid).unwrap());
        assert_eq!(proxy.get(&cid).unwrap(), mem.get(&cid).unwrap());

        let other = mem.put_cbor(&"world").unwrap();
        assert_eq!(proxy.get_cbor::<String>(&other).unwrap(), "world");
    }

    #[test]
    fn preserves_errors() {
        let mem = MemoryDB::default();
        let proxy = ProxyStore::new(&mem, "test");
        let cid = {
            let scratch = MemoryDB::default();
            scratch.put_cbor(&0u8).unwrap()
        };
        assert_eq!(proxy.get(&cid), mem.get(&cid));
        assert_eq!(proxy.get(&cid), Err(StoreError::NotFound(cid)));
    }
}
