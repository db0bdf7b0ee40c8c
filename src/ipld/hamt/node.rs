// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cell::OnceCell;

use cid::Cid;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::bitfield::Bitfield;
use super::hash_bits::HashBits;
use super::pointer::{Decoded, Pointer};
use super::{BytesKey, Error, HamtVersion, KeyValuePair, MAX_ARRAY_WIDTH, hash_key};
use crate::db::{Ipld, IpldExt as _};

/// Node in Hamt tree which contains bitfield of set indexes and pointers to nodes
#[derive(Debug)]
pub(crate) struct Node<V> {
    pub(crate) bitfield: Bitfield,
    pub(crate) pointers: Vec<Pointer<V>>,
    /// Pointer encoding, unknown for a decoded node without pointers.
    pub(crate) version: Option<HamtVersion>,
}

impl<V> Node<V> {
    pub(crate) fn new(version: HamtVersion) -> Self {
        Node {
            bitfield: Bitfield::default(),
            pointers: Vec::new(),
            version: Some(version),
        }
    }

    pub(crate) fn encoding(&self) -> HamtVersion {
        self.version.unwrap_or_default()
    }

    /// Pins the encoding of a node read from the store, failing if it was written in another.
    pub(crate) fn adopt_version(&mut self, version: HamtVersion) -> Result<(), Error> {
        match self.version.replace(version) {
            Some(found) if found != version => Err(Error::InvalidNode(
                "pointer encoding does not match the map version",
            )),
            _ => Ok(()),
        }
    }
}

impl<V: Serialize> Serialize for Node<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let version = self.encoding();
        let pointers: Vec<_> = self.pointers.iter().map(|p| p.encoded(version)).collect();
        (&self.bitfield, pointers).serialize(serializer)
    }
}

impl<'de, V: DeserializeOwned> Deserialize<'de> for Node<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bitfield, decoded): (Bitfield, Vec<Decoded<V>>) =
            Deserialize::deserialize(deserializer)?;
        if bitfield.count_ones_below(255) + usize::from(bitfield.test_bit(255)) != decoded.len() {
            return Err(de::Error::invalid_length(
                decoded.len(),
                &"as many pointers as bits set in the bitfield",
            ));
        }
        let mut version = None;
        let mut pointers = Vec::with_capacity(decoded.len());
        for Decoded(pointer, found) in decoded {
            if version.is_some_and(|v| v != found) {
                return Err(de::Error::custom(
                    "pointers of one node mix the legacy and current encodings",
                ));
            }
            version = Some(found);
            pointers.push(pointer);
        }
        Ok(Node {
            bitfield,
            pointers,
            version,
        })
    }
}

fn load_node<V, BS>(cid: &Cid, store: &BS, version: HamtVersion) -> Result<Node<V>, Error>
where
    V: DeserializeOwned,
    BS: Ipld,
{
    let mut node: Node<V> = store.get_cbor(cid)?;
    node.adopt_version(version)?;
    Ok(node)
}

fn load_cached<'a, V, BS>(
    cid: &Cid,
    cache: &'a OnceCell<Box<Node<V>>>,
    store: &BS,
    version: HamtVersion,
) -> Result<&'a Node<V>, Error>
where
    V: DeserializeOwned,
    BS: Ipld,
{
    if let Some(node) = cache.get() {
        return Ok(node);
    }
    let node = load_node(cid, store, version)?;
    Ok(cache.get_or_init(|| Box::new(node)))
}

impl<V> Node<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn get<BS: Ipld>(
        &self,
        k: &[u8],
        store: &BS,
        bit_width: u32,
    ) -> Result<Option<&V>, Error> {
        let hash = hash_key(k);
        self.get_value(&mut HashBits::new(&hash), bit_width, k, store)
    }

    /// Inserts `value` under `key`. Returns the replaced value, and whether the node changed.
    pub fn set<BS: Ipld>(
        &mut self,
        key: BytesKey,
        value: V,
        store: &BS,
        bit_width: u32,
        overwrite: bool,
    ) -> Result<(Option<V>, bool), Error> {
        let hash = hash_key(&key.0);
        self.modify_value(
            &mut HashBits::new(&hash),
            bit_width,
            key,
            value,
            store,
            overwrite,
        )
    }

    pub fn remove_entry<BS: Ipld>(
        &mut self,
        k: &[u8],
        store: &BS,
        bit_width: u32,
    ) -> Result<Option<(BytesKey, V)>, Error> {
        let hash = hash_key(k);
        self.rm_value(&mut HashBits::new(&hash), bit_width, k, store)
    }

    pub fn for_each<BS, F, E>(&self, store: &BS, f: &mut F) -> Result<(), E>
    where
        BS: Ipld,
        F: FnMut(&BytesKey, &V) -> Result<(), E>,
        E: From<Error>,
    {
        for p in &self.pointers {
            match p {
                Pointer::Link { cid, cache } => {
                    load_cached(cid, cache, store, self.encoding())?
                        .for_each(store, f)?;
                }
                Pointer::Dirty(node) => node.for_each(store, f)?,
                Pointer::Values(kvs) => {
                    for kv in kvs {
                        f(kv.key(), kv.value())?;
                    }
                }
            }
        }
        Ok(())
    }

    fn get_value<BS: Ipld>(
        &self,
        hashed_key: &mut HashBits,
        bit_width: u32,
        key: &[u8],
        store: &BS,
    ) -> Result<Option<&V>, Error> {
        let idx = hashed_key.next(bit_width)?;

        if !self.bitfield.test_bit(idx) {
            return Ok(None);
        }

        let cindex = self.index_for_bit_pos(idx);
        match &self.pointers[cindex] {
            Pointer::Link { cid, cache } => {
                load_cached(cid, cache, store, self.encoding())?
                    .get_value(hashed_key, bit_width, key, store)
            }
            Pointer::Dirty(node) => node.get_value(hashed_key, bit_width, key, store),
            Pointer::Values(vals) => Ok(vals
                .iter()
                .find(|kv| kv.key().0 == key)
                .map(|kv| kv.value())),
        }
    }

    fn modify_value<BS: Ipld>(
        &mut self,
        hashed_key: &mut HashBits,
        bit_width: u32,
        key: BytesKey,
        value: V,
        store: &BS,
        overwrite: bool,
    ) -> Result<(Option<V>, bool), Error> {
        let idx = hashed_key.next(bit_width)?;

        // No existing values at this point.
        if !self.bitfield.test_bit(idx) {
            self.insert_child(idx, key, value);
            return Ok((None, true));
        }

        let version = self.encoding();
        let cindex = self.index_for_bit_pos(idx);
        let child = &mut self.pointers[cindex];

        match child {
            Pointer::Link { cid, cache } => {
                let cid = *cid;
                let mut node = match cache.take() {
                    Some(node) => node,
                    None => Box::new(load_node(&cid, store, version)?),
                };
                let res =
                    node.modify_value(hashed_key, bit_width, key, value, store, overwrite)?;
                *child = if res.1 {
                    Pointer::Dirty(node)
                } else {
                    Pointer::Link {
                        cid,
                        cache: OnceCell::from(node),
                    }
                };
                Ok(res)
            }
            Pointer::Dirty(node) => {
                node.modify_value(hashed_key, bit_width, key, value, store, overwrite)
            }
            Pointer::Values(vals) => {
                // Update, if the key already exists.
                if let Some(i) = vals.iter().position(|p| p.key() == &key) {
                    if overwrite {
                        let old = std::mem::replace(&mut vals[i].1, value);
                        return Ok((Some(old), true));
                    }
                    return Ok((None, false));
                }

                // If the array is full, create a subshard and insert everything
                if vals.len() >= MAX_ARRAY_WIDTH {
                    let kvs = std::mem::take(vals);
                    let consumed = hashed_key.consumed;
                    let mut sub = Node::<V>::new(version);
                    for KeyValuePair(k, v) in kvs {
                        let hash = hash_key(&k.0);
                        sub.modify_value(
                            &mut HashBits::new_at_index(&hash, consumed),
                            bit_width,
                            k,
                            v,
                            store,
                            true,
                        )?;
                    }
                    sub.modify_value(hashed_key, bit_width, key, value, store, overwrite)?;
                    *child = Pointer::Dirty(Box::new(sub));
                    return Ok((None, true));
                }

                // Otherwise insert the element into the array in order.
                let at = vals
                    .iter()
                    .position(|c| c.key() > &key)
                    .unwrap_or(vals.len());
                vals.insert(at, KeyValuePair(key, value));
                Ok((None, true))
            }
        }
    }

    /// Internal method to delete entries.
    fn rm_value<BS: Ipld>(
        &mut self,
        hashed_key: &mut HashBits,
        bit_width: u32,
        key: &[u8],
        store: &BS,
    ) -> Result<Option<(BytesKey, V)>, Error> {
        let idx = hashed_key.next(bit_width)?;

        // No existing values at this point.
        if !self.bitfield.test_bit(idx) {
            return Ok(None);
        }

        let version = self.encoding();
        let cindex = self.index_for_bit_pos(idx);
        let child = &mut self.pointers[cindex];

        match child {
            Pointer::Link { cid, cache } => {
                let cid = *cid;
                let mut node = match cache.take() {
                    Some(node) => node,
                    None => Box::new(load_node(&cid, store, version)?),
                };
                let deleted = node.rm_value(hashed_key, bit_width, key, store)?;
                if deleted.is_none() {
                    *child = Pointer::Link {
                        cid,
                        cache: OnceCell::from(node),
                    };
                    return Ok(None);
                }
                *child = Pointer::Dirty(node);
                // Clean to retrieve canonical form
                child.clean()?;
                Ok(deleted)
            }
            Pointer::Dirty(node) => {
                let deleted = node.rm_value(hashed_key, bit_width, key, store)?;
                if deleted.is_some() {
                    child.clean()?;
                }
                Ok(deleted)
            }
            Pointer::Values(vals) => {
                // Delete value
                if let Some(i) = vals.iter().position(|p| p.key().0 == key) {
                    let KeyValuePair(k, v) = vals.remove(i);
                    if vals.is_empty() {
                        self.rm_child(cindex, idx);
                    }
                    return Ok(Some((k, v)));
                }
                Ok(None)
            }
        }
    }

    /// Writes every dirty child to the store, replacing it with a link.
    pub fn flush<BS: Ipld>(&mut self, store: &BS) -> Result<(), Error> {
        for pointer in &mut self.pointers {
            if let Pointer::Dirty(node) = pointer {
                node.flush(store)?;
                let cid = store.put_cbor(&**node)?;
                if let Pointer::Dirty(node) = std::mem::take(pointer) {
                    *pointer = Pointer::Link {
                        cid,
                        cache: OnceCell::from(node),
                    };
                }
            }
        }
        Ok(())
    }

    fn insert_child(&mut self, idx: u32, key: BytesKey, value: V) {
        let i = self.index_for_bit_pos(idx);
        self.bitfield.set_bit(idx);
        self.pointers
            .insert(i, Pointer::Values(vec![KeyValuePair(key, value)]));
    }

    fn rm_child(&mut self, i: usize, idx: u32) -> Pointer<V> {
        self.bitfield.clear_bit(idx);
        self.pointers.remove(i)
    }

    fn index_for_bit_pos(&self, bp: u32) -> usize {
        self.bitfield.count_ones_below(bp)
    }
}
