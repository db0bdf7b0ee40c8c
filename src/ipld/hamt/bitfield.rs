// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// 256 bit occupancy map of a node. Word 0 holds the least significant bits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bitfield([u64; 4]);

impl Serialize for Bitfield {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // minimal big-endian bytes
        let bytes: Vec<u8> = self
            .0
            .iter()
            .rev()
            .flat_map(|w| w.to_be_bytes())
            .skip_while(|&b| b == 0)
            .collect();
        serde_bytes::Serialize::serialize(&bytes, serializer)
    }
}

impl<'de> Deserialize<'de> for Bitfield {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: serde_bytes::ByteBuf = Deserialize::deserialize(deserializer)?;
        if bytes.len() > 32 {
            return Err(de::Error::invalid_length(
                bytes.len(),
                &"a bitfield of no more than 32 bytes",
            ));
        }
        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(&bytes);
        let mut words = [0u64; 4];
        for (i, chunk) in padded.chunks_exact(8).enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            words[3 - i] = u64::from_be_bytes(word);
        }
        Ok(Self(words))
    }
}

impl Bitfield {
    pub fn test_bit(&self, idx: u32) -> bool {
        let (w, b) = Self::position(idx);
        self.0[w] & (1 << b) != 0
    }

    pub fn set_bit(&mut self, idx: u32) {
        let (w, b) = Self::position(idx);
        self.0[w] |= 1 << b;
    }

    pub fn clear_bit(&mut self, idx: u32) {
        let (w, b) = Self::position(idx);
        self.0[w] &= !(1 << b);
    }

    /// Number of set bits strictly below `idx`.
    pub fn count_ones_below(&self, idx: u32) -> usize {
        let (w, b) = Self::position(idx);
        let below: u32 = self.0[..w].iter().map(|x| x.count_ones()).sum();
        let partial = (self.0[w] & ((1u64 << b) - 1)).count_ones();
        (below + partial) as usize
    }

    fn position(idx: u32) -> (usize, u32) {
        debug_assert!(idx < 256);
        ((idx / 64) as usize, idx % 64)
    }
}
