// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::HashMap;
use cid::Cid;
use parking_lot::RwLock;

use super::{Ipld, StoreError};

/// In-memory block store. Safe to share between threads.
#[derive(Debug, Default)]
pub struct MemoryDB {
    blockchain_db: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl MemoryDB {
    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blockchain_db.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blockchain_db.read().is_empty()
    }
}

impl Ipld for MemoryDB {
    fn contains(&self, cid: &Cid) -> Result<bool, StoreError> {
        Ok(self.blockchain_db.read().contains_key(cid))
    }

    fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        self.blockchain_db
            .read()
            .get(cid)
            .cloned()
            .ok_or(StoreError::NotFound(*cid))
    }

    fn set(&self, cid: Cid, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.blockchain_db.write().insert(cid, bytes);
        Ok(())
    }
}
