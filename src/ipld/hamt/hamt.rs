// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::node::Node;
use super::{BytesKey, DEFAULT_BIT_WIDTH, Error, HamtVersion};
use crate::db::{Ipld, IpldExt as _};

/// Implementation of the HAMT data structure for IPLD.
///
/// # Examples
///
/// ```
/// use forest_actor_vm::db::MemoryDB;
/// use forest_actor_vm::ipld::hamt::Hamt;
///
/// let store = MemoryDB::default();
///
/// let mut map: Hamt<_, String> = Hamt::new(&store);
/// map.set(b"1".to_vec().into(), "a".to_string()).unwrap();
/// assert_eq!(map.get(b"1").unwrap(), Some(&"a".to_string()));
/// assert_eq!(map.delete(b"1").unwrap().map(|(_, v)| v), Some("a".to_string()));
/// assert_eq!(map.get(b"1").unwrap(), None);
/// let cid = map.flush().unwrap();
/// ```
#[derive(Debug)]
pub struct Hamt<BS, V> {
    root: Node<V>,
    store: BS,
    bit_width: u32,
}

impl<BS, V> Hamt<BS, V>
where
    BS: Ipld,
    V: Serialize + DeserializeOwned,
{
    pub fn new(store: BS) -> Self {
        Self::new_with_version(store, HamtVersion::default())
    }

    /// Construct hamt writing pointers in the encoding of `version`.
    pub fn new_with_version(store: BS, version: HamtVersion) -> Self {
        Self {
            root: Node::new(version),
            store,
            bit_width: DEFAULT_BIT_WIDTH,
        }
    }

    /// Lazily instantiate a hamt from this root Cid.
    pub fn load(root_cid: &Cid, store: BS) -> Result<Self, Error> {
        Self::load_with_version(root_cid, store, HamtVersion::default())
    }

    /// Lazily instantiate a hamt from this root Cid. Nodes written in an encoding other than
    /// `version` are rejected.
    pub fn load_with_version(
        root_cid: &Cid,
        store: BS,
        version: HamtVersion,
    ) -> Result<Self, Error> {
        let mut root: Node<V> = store.get_cbor(root_cid)?;
        root.adopt_version(version)?;
        Ok(Self {
            root,
            store,
            bit_width: DEFAULT_BIT_WIDTH,
        })
    }

    /// Pointer encoding the map is written in.
    pub fn version(&self) -> HamtVersion {
        self.root.encoding()
    }

    /// Returns a reference to the underlying store of the Hamt.
    pub fn store(&self) -> &BS {
        &self.store
    }

    /// Inserts a key-value pair into the HAMT, returning the value it replaced.
    pub fn set(&mut self, key: BytesKey, value: V) -> Result<Option<V>, Error> {
        self.root
            .set(key, value, &self.store, self.bit_width, true)
            .map(|(old, _)| old)
    }

    /// Inserts a key-value pair unless the key is already present. Returns whether the value
    /// was inserted.
    pub fn set_if_absent(&mut self, key: BytesKey, value: V) -> Result<bool, Error> {
        self.root
            .set(key, value, &self.store, self.bit_width, false)
            .map(|(_, modified)| modified)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, k: &[u8]) -> Result<Option<&V>, Error> {
        self.root.get(k, &self.store, self.bit_width)
    }

    pub fn contains_key(&self, k: &[u8]) -> Result<bool, Error> {
        Ok(self.get(k)?.is_some())
    }

    /// Removes a key from the HAMT, returning the entry if it was present.
    pub fn delete(&mut self, k: &[u8]) -> Result<Option<(BytesKey, V)>, Error> {
        self.root.remove_entry(k, &self.store, self.bit_width)
    }

    /// Flush root and return Cid for hamt
    pub fn flush(&mut self) -> Result<Cid, Error> {
        self.root.flush(&self.store)?;
        Ok(self.store.put_cbor(&self.root)?)
    }

    /// Returns true if the HAMT has no entries
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Iterates over each KV in the Hamt and runs a function on the values.
    pub fn for_each<F, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&BytesKey, &V) -> Result<(), E>,
        E: From<Error>,
    {
        self.root.for_each(&self.store, &mut f)
    }

    /// Collects every entry in key hash order.
    pub fn entries(&self) -> Result<Vec<(BytesKey, V)>, Error>
    where
        V: Clone,
    {
        let mut out = Vec::new();
        self.for_each(|k, v| {
            out.push((k.clone(), v.clone()));
            Ok::<_, Error>(())
        })?;
        Ok(out)
    }
}
