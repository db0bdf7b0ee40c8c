// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cell::OnceCell;

use cid::Cid;
use ipld_core::ipld::Ipld as IpldValue;
use serde::de::{self, DeserializeOwned};
use serde::ser::{self, SerializeMap as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::node::Node;
use super::{Error, HamtVersion, KeyValuePair, MAX_ARRAY_WIDTH};

const LINK_KEY: &str = "0";
const BUCKET_KEY: &str = "1";

/// Pointer to index values or a link to another child node.
#[derive(Debug)]
pub(crate) enum Pointer<V> {
    Values(Vec<KeyValuePair<V>>),
    Link {
        cid: Cid,
        cache: OnceCell<Box<Node<V>>>,
    },
    Dirty(Box<Node<V>>),
}

impl<V> Default for Pointer<V> {
    fn default() -> Self {
        Pointer::Values(Vec::new())
    }
}

/// Pointer borrowed together with the encoding it is written in.
pub(crate) struct Encoded<'a, V> {
    pointer: &'a Pointer<V>,
    version: HamtVersion,
}

impl<V: Serialize> Serialize for Encoded<'_, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match (self.pointer, self.version) {
            (Pointer::Dirty(_), _) => Err(ser::Error::custom("Cannot serialize cached values")),
            (Pointer::Values(vals), HamtVersion::V3) => vals.serialize(serializer),
            (Pointer::Link { cid, .. }, HamtVersion::V3) => cid.serialize(serializer),
            (Pointer::Values(vals), HamtVersion::V0) => single_entry(serializer, BUCKET_KEY, vals),
            (Pointer::Link { cid, .. }, HamtVersion::V0) => single_entry(serializer, LINK_KEY, cid),
        }
    }
}

fn single_entry<S, T>(serializer: S, key: &str, value: &T) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

/// Pointer read from a node, with the encoding it was found in.
pub(crate) struct Decoded<V>(pub Pointer<V>, pub HamtVersion);

impl<'de, V: DeserializeOwned> Deserialize<'de> for Decoded<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match IpldValue::deserialize(deserializer)? {
            IpldValue::Map(map) => {
                let len = map.len();
                let mut entries = map.into_iter();
                let (Some((key, value)), None) = (entries.next(), entries.next()) else {
                    return Err(de::Error::invalid_length(len, &"a single-entry pointer map"));
                };
                match (key.as_str(), value) {
                    (LINK_KEY, inner @ IpldValue::Link(_))
                    | (BUCKET_KEY, inner @ IpldValue::List(_)) => {
                        Ok(Self(Pointer::from_ipld(inner)?, HamtVersion::V0))
                    }
                    _ => Err(de::Error::invalid_type(
                        de::Unexpected::Map,
                        &r#"{"0": link} or {"1": bucket}"#,
                    )),
                }
            }
            other => Ok(Self(Pointer::from_ipld(other)?, HamtVersion::V3)),
        }
    }
}

impl<V: DeserializeOwned> Pointer<V> {
    fn from_ipld<E: de::Error>(ipld: IpldValue) -> Result<Self, E> {
        match ipld {
            IpldValue::Link(cid) => Ok(Pointer::Link {
                cid,
                cache: Default::default(),
            }),
            bucket @ IpldValue::List(_) => {
                let values: Vec<KeyValuePair<V>> =
                    ipld_core::serde::from_ipld(bucket).map_err(de::Error::custom)?;
                if values.is_empty() || values.len() > MAX_ARRAY_WIDTH {
                    return Err(de::Error::invalid_length(
                        values.len(),
                        &"a bucket of 1 to 3 entries",
                    ));
                }
                Ok(Pointer::Values(values))
            }
            _ => Err(de::Error::custom(
                "invalid type: expected a link or a bucket of entries",
            )),
        }
    }
}

impl<V> Pointer<V> {
    pub(crate) fn encoded(&self, version: HamtVersion) -> Encoded<'_, V> {
        Encoded {
            pointer: self,
            version,
        }
    }

    /// Internal method to cleanup children, to ensure consistent tree representation
    /// after deletes.
    pub(crate) fn clean(&mut self) -> Result<(), Error> {
        let Pointer::Dirty(n) = self else {
            return Ok(());
        };
        match n.pointers.len() {
            0 => Err(Error::InvalidNode("child node has no pointers")),
            1 => {
                // A single bucket collapses into its parent
                if let Pointer::Values(vals) = &mut n.pointers[0] {
                    let vals = std::mem::take(vals);
                    *self = Pointer::Values(vals);
                }
                Ok(())
            }
            2..=MAX_ARRAY_WIDTH => {
                let mut total = 0;
                for p in &n.pointers {
                    match p {
                        Pointer::Values(vals) => total += vals.len(),
                        _ => return Ok(()),
                    }
                }
                if total > MAX_ARRAY_WIDTH {
                    return Ok(());
                }
                let mut child_vals: Vec<KeyValuePair<V>> = n
                    .pointers
                    .drain(..)
                    .flat_map(|p| match p {
                        Pointer::Values(vals) => vals,
                        _ => Vec::new(),
                    })
                    .collect();
                child_vals.sort_unstable_by(|a, b| a.key().cmp(b.key()));
                *self = Pointer::Values(child_vals);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
